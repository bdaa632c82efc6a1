use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::DateBounds;

/// Format a message time relative to `today`:
/// - Same day: "14:05"
/// - Same year: "Jan 15 14:05"
/// - Otherwise: "Dec 3, 2023 14:05"
pub fn format_message_time(timestamp: &NaiveDateTime, today: NaiveDate) -> String {
    let date = timestamp.date();
    if date == today {
        timestamp.format("%H:%M").to_string()
    } else if date.year() == today.year() {
        timestamp.format("%b %-d %H:%M").to_string()
    } else {
        timestamp.format("%b %-d, %Y %H:%M").to_string()
    }
}

/// "Jan 12, 2024 to Mar 3, 2024", or a single date when both ends fall on one day
pub fn format_date_bounds(bounds: &DateBounds) -> String {
    let earliest = bounds.earliest.format("%b %-d, %Y").to_string();
    if bounds.earliest.date() == bounds.latest.date() {
        return earliest;
    }
    format!("{} to {}", earliest, bounds.latest.format("%b %-d, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_same_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(format_message_time(&at(2024, 3, 10, 9, 5), today), "09:05");
    }

    #[test]
    fn test_same_year() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(format_message_time(&at(2024, 1, 15, 14, 5), today), "Jan 15 14:05");
    }

    #[test]
    fn test_other_year() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(format_message_time(&at(2023, 12, 3, 23, 59), today), "Dec 3, 2023 23:59");
    }

    #[test]
    fn test_date_bounds() {
        let span = DateBounds { earliest: at(2024, 1, 12, 10, 0), latest: at(2024, 3, 3, 8, 0) };
        assert_eq!(format_date_bounds(&span), "Jan 12, 2024 to Mar 3, 2024");

        let one_day = DateBounds { earliest: at(2024, 1, 12, 10, 0), latest: at(2024, 1, 12, 22, 0) };
        assert_eq!(format_date_bounds(&one_day), "Jan 12, 2024");
    }
}

//! Index and date windows over the message list.
//!
//! Index bounds are 1-based and inclusive, matching [`Message::index`]. Date bounds
//! compare whole days, so a window ending on a date keeps that entire day.
//!
//! As text, an index window is `N-M` and a date window is `YYYY-MM-DD..YYYY-MM-DD`;
//! either side may be left empty. Blank text is the unbounded window.

use std::fmt;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DateBounds, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    Index,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageWindow {
    pub mode: FilterMode,
    pub low: Option<usize>,
    pub high: Option<usize>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl MessageWindow {
    pub fn by_index(low: Option<usize>, high: Option<usize>) -> Self {
        Self { mode: FilterMode::Index, low, high, ..Self::default() }
    }

    pub fn by_date(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { mode: FilterMode::Date, start, end, ..Self::default() }
    }

    /// Date window covering all of `bounds`, or unbounded when there are no messages
    pub fn spanning(bounds: Option<DateBounds>) -> Self {
        match bounds {
            Some(bounds) => {
                Self::by_date(Some(bounds.earliest.date()), Some(bounds.latest.date()))
            }
            None => Self::by_date(None, None),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        match self.mode {
            FilterMode::Index => self.low.is_none() && self.high.is_none(),
            FilterMode::Date => self.start.is_none() && self.end.is_none(),
        }
    }

    pub fn contains(&self, message: &Message) -> bool {
        match self.mode {
            FilterMode::Index => {
                self.low.is_none_or(|low| message.index >= low)
                    && self.high.is_none_or(|high| message.index <= high)
            }
            FilterMode::Date => {
                let day = message.timestamp.date();
                self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
            }
        }
    }

    pub fn apply<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        messages.iter().filter(|m| self.contains(m)).collect()
    }

    /// Parse `N-M` or `YYYY-MM-DD..YYYY-MM-DD`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        if let Some((start, end)) = input.split_once("..") {
            let window = Self::by_date(parse_bound(start, parse_day)?, parse_bound(end, parse_day)?);
            if let (Some(start), Some(end)) = (window.start, window.end)
                && start > end
            {
                bail!("Window starts after it ends: {start} > {end}");
            }
            return Ok(window);
        }

        let Some((low, high)) = input.split_once('-') else {
            bail!("Invalid window: '{input}' (expected N-M or YYYY-MM-DD..YYYY-MM-DD)");
        };
        let window = Self::by_index(parse_bound(low, parse_index)?, parse_bound(high, parse_index)?);
        if let (Some(low), Some(high)) = (window.low, window.high)
            && low > high
        {
            bail!("Window starts after it ends: {low} > {high}");
        }
        Ok(window)
    }
}

fn parse_bound<T>(text: &str, parse: fn(&str) -> Result<T>) -> Result<Option<T>> {
    let text = text.trim();
    if text.is_empty() { Ok(None) } else { parse(text).map(Some) }
}

fn parse_index(text: &str) -> Result<usize> {
    let index: usize = text.parse().with_context(|| format!("Invalid message number: '{text}'"))?;
    if index == 0 {
        bail!("Message numbers start at 1");
    }
    Ok(index)
}

fn parse_day(text: &str) -> Result<NaiveDate> {
    if text.len() == 10
        && let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
    {
        return Ok(day);
    }
    bail!("Invalid date format: '{text}' (expected YYYY-MM-DD)")
}

impl fmt::Display for MessageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return Ok(());
        }
        let side = |value: Option<String>| value.unwrap_or_default();
        match self.mode {
            FilterMode::Index => write!(
                f,
                "{}-{}",
                side(self.low.map(|n| n.to_string())),
                side(self.high.map(|n| n.to_string()))
            ),
            FilterMode::Date => write!(
                f,
                "{}..{}",
                side(self.start.map(|d| d.to_string())),
                side(self.end.map(|d| d.to_string()))
            ),
        }
    }
}

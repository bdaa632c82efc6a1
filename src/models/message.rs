use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One entry of a chat export, in source order.
///
/// `sender` is `None` for system lines ("Messages are end-to-end encrypted", group
/// renames, ...). `index` is the 1-based position in the export and survives filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub sender: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.sender.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub message_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
}

impl DateBounds {
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.earliest && *timestamp <= self.latest
    }
}

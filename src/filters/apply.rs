use anyhow::Result;

use super::ast::{Condition, FilterExpr, Join, Presence};
use crate::models::Message;
use crate::parsers::media_kind;

/// Keep the messages matching `filter`, in source order
pub fn apply_filters(messages: Vec<Message>, filter: &FilterExpr) -> Result<Vec<Message>> {
    if filter.is_empty() {
        return Ok(messages);
    }

    Ok(messages.into_iter().filter(|message| matches_filter(message, filter)).collect())
}

/// Evaluate a filter against one message, folding its conditions left to right
pub fn matches_filter(message: &Message, filter: &FilterExpr) -> bool {
    let Some(head) = filter.head() else {
        return true;
    };

    filter.rest().iter().fold(head.matches(message), |result, (join, condition)| match join {
        Join::And => result && condition.matches(message),
        Join::Or => result || condition.matches(message),
    })
}

impl Condition {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            // System lines have no sender and never match
            Self::From(needle) => message
                .sender
                .as_deref()
                .is_some_and(|sender| sender.to_lowercase().contains(needle.as_str())),
            Self::Since(day) => message.timestamp.date() >= *day,
            Self::Until(day) => message.timestamp.date() <= *day,
            Self::Has(presence) => message.attachment.as_deref().is_some_and(|file_name| {
                *presence == Presence::Attachment || media_kind(file_name).is_playable()
            }),
        }
    }
}

use serde::{Deserialize, Serialize};

/// How an attachment is presented, decided from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "file",
        }
    }

    /// Whether the view reports load/error events for this kind (downloads don't)
    pub fn is_playable(self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

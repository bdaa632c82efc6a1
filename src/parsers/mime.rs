use crate::models::MediaKind;

/// MIME type for a file name, from its extension.
///
/// Voice notes (`.opus`) are mapped explicitly since chat exports use them heavily.
pub fn mime_type_of(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".opus") {
        return Some("audio/ogg");
    }
    mime_guess::from_path(&lower).first_raw()
}

/// Rendering category for a file name; unknown types are [`MediaKind::Other`]
pub fn media_kind(file_name: &str) -> MediaKind {
    match mime_type_of(file_name) {
        Some(mime) if mime.starts_with("image/") => MediaKind::Image,
        Some(mime) if mime.starts_with("video/") => MediaKind::Video,
        Some(mime) if mime.starts_with("audio/") => MediaKind::Audio,
        _ => MediaKind::Other,
    }
}

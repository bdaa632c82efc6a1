use anyhow::{Context, Result};
use arboard::Clipboard;

use crate::models::Message;

/// Maximum clipboard payload (10MB)
const MAX_CLIPBOARD_SIZE: usize = 10 * 1024 * 1024;

/// Clipboard operations, mockable in tests
trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to initialize clipboard")?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text).context("Failed to set clipboard contents")?;
        Ok(())
    }
}

fn validate_clipboard_text(text: &str) -> Result<()> {
    if text.is_empty() {
        anyhow::bail!("Cannot copy empty text to clipboard");
    }

    if text.len() > MAX_CLIPBOARD_SIZE {
        anyhow::bail!(
            "Text too large for clipboard ({} bytes, max {})",
            text.len(),
            MAX_CLIPBOARD_SIZE
        );
    }

    Ok(())
}

fn copy_with_provider(text: &str, provider: &mut dyn ClipboardProvider) -> Result<()> {
    validate_clipboard_text(text)?;
    provider.set_text(text)
}

/// Text copied for a message: the body, prefixed with sender and time when `with_header`
pub fn message_clipboard_text(message: &Message, with_header: bool) -> String {
    if !with_header {
        return message.body.clone();
    }
    let time = message.timestamp.format("%Y-%m-%d %H:%M");
    match &message.sender {
        Some(sender) => format!("[{time}] {sender}: {}", message.body),
        None => format!("[{time}] {}", message.body),
    }
}

/// Copy text to the system clipboard.
///
/// # Errors
/// Returns error if:
/// - Text is empty
/// - Text is too large for clipboard (>10MB)
/// - System clipboard is unavailable (headless environment, permissions)
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    // Validate before touching the clipboard so headless runs still get the real error
    validate_clipboard_text(text)?;
    let mut clipboard = SystemClipboard::new()?;
    copy_with_provider(text, &mut clipboard)
}

/// Copy a message's body to the system clipboard
pub fn copy_message(message: &Message) -> Result<()> {
    copy_to_clipboard(&message_clipboard_text(message, false))
}

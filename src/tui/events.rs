use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

/// User actions from keyboard events
#[derive(Debug, PartialEq)]
pub enum Action {
    Quit,
    Escape,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Select the focused conversation, or apply the filter while editing
    Enter,
    CopyToClipboard,
    StartFilter,
    /// Edit the index or date window on the input line
    EditWindow,
    /// Switch between index and date windows; a date window starts at the date bounds
    ToggleWindowMode,
    ToggleFocus,
    Back,
    Forward,
    ToggleAnonymize,
    CycleActiveUser,
    InputChar(char),
    DeleteChar,
    None,
}

/// Poll for keyboard events and convert to actions
pub fn poll_event(timeout: Duration, editing: bool) -> anyhow::Result<Action> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
    {
        return Ok(key_to_action(key, editing));
    }
    Ok(Action::None)
}

/// Map a key to an action. While `editing` the filter line, printable keys are text.
pub fn key_to_action(key: KeyEvent, editing: bool) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Esc, _) => Action::Escape,

        // Navigation (Emacs style works in both modes)
        (KeyCode::Char('p'), KeyModifiers::CONTROL) | (KeyCode::Up, _) => Action::MoveUp,
        (KeyCode::Char('n'), KeyModifiers::CONTROL) | (KeyCode::Down, _) => Action::MoveDown,
        (KeyCode::PageUp, _) => Action::PageUp,
        (KeyCode::PageDown, _) => Action::PageDown,

        (KeyCode::Enter, _) => Action::Enter,
        (KeyCode::Char('y'), KeyModifiers::CONTROL) => Action::CopyToClipboard,
        (KeyCode::Tab, _) => Action::ToggleFocus,

        (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT)
            if editing =>
        {
            Action::InputChar(c)
        }
        (KeyCode::Backspace, _) if editing => Action::DeleteChar,

        (KeyCode::Char('/'), KeyModifiers::NONE) => Action::StartFilter,
        (KeyCode::Char('['), _) => Action::Back,
        (KeyCode::Char(']'), _) => Action::Forward,
        (KeyCode::Char('a'), KeyModifiers::NONE) => Action::ToggleAnonymize,
        (KeyCode::Char('u'), KeyModifiers::NONE) => Action::CycleActiveUser,
        (KeyCode::Char('w'), KeyModifiers::NONE) => Action::EditWindow,
        (KeyCode::Char('m'), KeyModifiers::NONE) => Action::ToggleWindowMode,
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,

        _ => Action::None,
    }
}

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows reserved for the attachment panel under the messages
const ATTACHMENT_ROWS: u16 = 5;
/// Rows reserved for the conversation details under the conversation list
const DETAILS_ROWS: u16 = 8;

/// Pane layout:
/// - Sidebar (30%): conversations above, details below
/// - Main (70%): messages above, attachment panel below
/// - Filter input and status bar: one row each at the bottom
pub struct AppLayout {
    pub conversations_area: Rect,
    pub details_area: Rect,
    pub messages_area: Rect,
    pub attachment_area: Rect,
    pub input_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let vertical_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let horizontal_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(vertical_chunks[0]);

        let sidebar_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(DETAILS_ROWS)])
            .split(horizontal_chunks[0]);

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(ATTACHMENT_ROWS)])
            .split(horizontal_chunks[1]);

        Self {
            conversations_area: sidebar_chunks[0],
            details_area: sidebar_chunks[1],
            messages_area: main_chunks[0],
            attachment_area: main_chunks[1],
            input_area: vertical_chunks[1],
            status_area: vertical_chunks[2],
        }
    }
}

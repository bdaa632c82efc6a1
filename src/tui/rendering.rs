use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::app::{Focus, MessageType, StatusMessage};
use super::layout::AppLayout;
use super::timestamps::{format_date_bounds, format_message_time};
use crate::models::{DateBounds, Message, Participant};

const MUTED: Color = Color::Rgb(113, 113, 122);
const BRIGHT: Color = Color::Rgb(250, 250, 250);
const ACCENT: Color = Color::Rgb(16, 185, 129);
const ERROR: Color = Color::Rgb(239, 68, 68);
const BAR: Color = Color::Rgb(24, 24, 27);
const HIGHLIGHT: Color = Color::Rgb(250, 204, 21);

/// Everything the UI shows for one frame
pub struct RenderState<'a> {
    pub conversations: &'a [String],
    pub current: &'a str,
    pub conversation_idx: usize,
    pub focus: Focus,
    pub load_label: Option<String>,
    pub messages: &'a [&'a Message],
    pub selected_idx: usize,
    pub total_count: usize,
    pub participants: &'a [Participant],
    pub date_bounds: Option<DateBounds>,
    pub anonymize: bool,
    pub active_user: Option<&'a str>,
    pub attachment_lines: Vec<String>,
    pub search_query: &'a str,
    /// Current window, `all` when unbounded
    pub window: String,
    /// Text being typed for the window, while editing it
    pub window_input: Option<&'a str>,
    pub editing: bool,
    pub filter_error: Option<&'a str>,
    pub status_message: Option<&'a StatusMessage>,
    pub today: NaiveDate,
}

/// Render the entire UI
pub fn render_ui(frame: &mut Frame, state: &RenderState) {
    let layout = AppLayout::new(frame.area());

    render_conversations(frame, layout.conversations_area, state);
    render_details(frame, layout.details_area, state);
    render_messages(frame, layout.messages_area, state);
    render_attachment(frame, layout.attachment_area, &state.attachment_lines);
    render_input(frame, layout.input_area, state);
    render_status_bar(frame, layout.status_area, state);
}

fn pane(title: String, focused: bool) -> Block<'static> {
    let border = if focused { ACCENT } else { MUTED };
    Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)).title(title)
}

fn render_conversations(frame: &mut Frame, area: Rect, state: &RenderState) {
    let items: Vec<ListItem> = state
        .conversations
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let marker = if id == state.current { "● " } else { "  " };
            let style = if idx == state.conversation_idx && state.focus == Focus::Conversations {
                Style::default().fg(BRIGHT).bg(ACCENT).add_modifier(Modifier::BOLD)
            } else if id == state.current {
                Style::default().fg(BRIGHT)
            } else {
                Style::default().fg(MUTED)
            };
            ListItem::new(format!("{marker}{id}")).style(style)
        })
        .collect();

    let title = format!(" Chats ({}) ", state.conversations.len());
    let list = List::new(items).block(pane(title, state.focus == Focus::Conversations));
    frame.render_widget(list, area);
}

fn render_details(frame: &mut Frame, area: Rect, state: &RenderState) {
    let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(MUTED));

    let span = state.date_bounds.as_ref().map(format_date_bounds).unwrap_or_else(|| "-".to_string());
    let names: Vec<&str> = state.participants.iter().map(|p| p.name.as_str()).collect();
    let lines = vec![
        Line::from(vec![label("Dates: "), Span::raw(span)]),
        Line::from(vec![label("Window: "), Span::raw(state.window.clone())]),
        Line::from(vec![
            label("People: "),
            Span::raw(if names.is_empty() { "-".to_string() } else { names.join(", ") }),
        ]),
        Line::from(vec![
            label("Active: "),
            Span::styled(
                state.active_user.unwrap_or("-").to_string(),
                Style::default().fg(HIGHLIGHT),
            ),
        ]),
        Line::from(vec![
            label("Anonymize: "),
            Span::raw(if state.anonymize { "on" } else { "off" }),
        ]),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(pane(" Details ".to_string(), false))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_messages(frame: &mut Frame, area: Rect, state: &RenderState) {
    let focused = state.focus == Focus::Messages;
    let items: Vec<ListItem> = state
        .messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let time = format_message_time(&message.timestamp, state.today);
            let sender = message.sender.as_deref().unwrap_or("*");
            let first_line = message.body.lines().next().unwrap_or("");
            let clip = if message.attachment.is_some() { "📎 " } else { "" };

            let is_active =
                state.active_user.is_some() && message.sender.as_deref() == state.active_user;
            let style = if idx == state.selected_idx && focused {
                Style::default().fg(BRIGHT).bg(ACCENT).add_modifier(Modifier::BOLD)
            } else if is_active {
                Style::default().fg(HIGHLIGHT)
            } else if message.is_system() {
                Style::default().fg(MUTED).add_modifier(Modifier::ITALIC)
            } else {
                Style::default().fg(BRIGHT)
            };

            ListItem::new(format!("{time} {sender}: {clip}{first_line}")).style(style)
        })
        .collect();

    let title = match &state.load_label {
        Some(label) => format!(" {} ({label}) ", state.current),
        None if state.current.is_empty() => " Messages ".to_string(),
        None => format!(" {} ", state.current),
    };
    let list = List::new(items).block(pane(title, focused));
    frame.render_widget(list, area);
}

fn render_attachment(frame: &mut Frame, area: Rect, lines: &[String]) {
    let text = if lines.is_empty() {
        Text::from(Line::styled("No attachment", Style::default().fg(MUTED)))
    } else {
        Text::from(lines.iter().map(|l| Line::from(l.as_str())).collect::<Vec<_>>())
    };
    let paragraph = Paragraph::new(text)
        .block(pane(" Attachment ".to_string(), false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, area: Rect, state: &RenderState) {
    let prompt_style = if state.editing { Style::default().fg(ACCENT) } else { Style::default().fg(MUTED) };
    let (prompt, text) = match state.window_input {
        Some(input) => ("window ", input),
        None => ("/ ", state.search_query),
    };
    let line = Line::from(vec![
        Span::styled(prompt, prompt_style),
        Span::raw(text.to_string()),
        Span::styled(if state.editing { "▏" } else { "" }, prompt_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &RenderState) {
    let bar = Style::default().fg(BRIGHT).bg(BAR);

    let (status_text, style) = if let Some(error) = state.filter_error {
        (format!(" [ERROR] {error} "), Style::default().fg(ERROR).bg(BAR))
    } else if let Some(message) = state.status_message {
        let fg = match message.message_type {
            MessageType::Success => ACCENT,
            MessageType::Error => ERROR,
        };
        (format!(" {} ", message.text), Style::default().fg(fg).bg(BAR))
    } else if state.messages.is_empty() {
        (" No messages | Tab: switch pane | Enter: open | [ ]: back/forward | Ctrl+C: quit ".to_string(), bar)
    } else {
        let mut parts = vec![];
        if state.messages.len() < state.total_count {
            parts.push(format!("{}/{} messages", state.messages.len(), state.total_count));
        } else {
            parts.push(format!("{} messages", state.total_count));
        }
        parts.push(format!("msg {}/{}", state.selected_idx + 1, state.messages.len()));
        parts.push("/: filter".to_string());
        parts.push("w/m: window".to_string());
        parts.push("a: anonymize".to_string());
        parts.push("u: user".to_string());
        parts.push("Ctrl+Y: copy".to_string());
        (format!(" {} ", parts.join(" | ")), bar)
    };

    frame.render_widget(Paragraph::new(status_text).style(style), area);
}

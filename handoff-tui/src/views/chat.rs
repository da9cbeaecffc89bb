//! End-user chat and operator live-chat views.

use crate::state::App;
use crate::views::helpers::{render_composer, render_conversation};
use handoff_client::ConnectionState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

fn split(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

pub fn render_user_chat(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (conversation_area, status_area, input_area) = split(area);
    let chat = &app.user_chat;

    let title = match chat.session_id() {
        Some(id) => format!("Chat {}", id),
        None => "Chat".to_string(),
    };
    render_conversation(f, app, chat.conversation(), &title, None, conversation_area);

    let (status, color) = if chat.awaiting_reply() {
        ("Agent is typing…", app.theme.text_dim)
    } else if chat.state() == ConnectionState::Disconnected {
        ("Disconnected. Restart the chat to continue.", app.theme.error)
    } else {
        ("", app.theme.text_dim)
    };
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(color)),
        status_area,
    );

    render_composer(f, app, input_area, "Type a message and press Enter");
}

pub fn render_operator_chat(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(chat) = app.operator_chat.as_ref() else {
        f.render_widget(Paragraph::new("Not joined"), area);
        return;
    };
    let (conversation_area, status_area, input_area) = split(area);

    let title = format!("Live chat {}", chat.session_id());
    render_conversation(f, app, chat.conversation(), &title, None, conversation_area);

    let (status, color) = if let Some(error) = chat.error() {
        (error.to_string(), app.theme.error)
    } else if chat.is_resolved() {
        ("Chat closed".to_string(), app.theme.text_dim)
    } else if chat.override_enabled() {
        ("You are in control of this conversation".to_string(), app.theme.success)
    } else {
        ("Waiting for override…".to_string(), app.theme.warning)
    };
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(color)),
        status_area,
    );

    let placeholder = if chat.is_resolved() {
        "This session is resolved"
    } else {
        "Press i to reply"
    };
    render_composer(f, app, input_area, placeholder);
}

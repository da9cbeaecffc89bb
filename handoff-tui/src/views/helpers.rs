//! Shared rendering for conversations and the text composer.

use crate::state::{App, EditTarget};
use crate::theme::role_color;
use handoff_core::{Conversation, Message};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn two_column(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

fn message_item(message: &Message, app: &App) -> ListItem<'static> {
    let color = role_color(message.role, message.is_human_support(), &app.theme);
    let mut header = vec![Span::styled(
        message.sender_label().to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    let stamp = message.display_timestamp();
    if !stamp.is_empty() {
        header.push(Span::styled(
            format!("  {}", stamp),
            Style::default().fg(app.theme.text_dim),
        ));
    }
    if message.flagged {
        header.push(Span::styled("  ⚑ flagged", Style::default().fg(app.theme.error)));
    }

    let mut lines = vec![Line::from(header)];
    if let Some(handoff) = &message.handoff {
        lines.push(Line::from(Span::styled(
            format!("  ↪ {} → {}", handoff.from, handoff.to),
            Style::default().fg(app.theme.text_dim),
        )));
    }
    if let Some(tool) = &message.tool_call {
        lines.push(Line::from(Span::styled(
            format!("  ⚙ {}", tool.name),
            Style::default().fg(app.theme.text_dim),
        )));
    }
    for text in message.content.lines() {
        lines.push(Line::from(Span::styled(
            format!("  {}", text),
            Style::default().fg(app.theme.text),
        )));
    }
    lines.push(Line::from(""));
    ListItem::new(lines)
}

/// Draw a conversation; without a selection the list follows the newest turn.
pub fn render_conversation(
    f: &mut Frame<'_>,
    app: &App,
    conversation: &Conversation,
    title: &str,
    selected: Option<usize>,
    area: Rect,
) {
    let items: Vec<ListItem> = conversation
        .iter()
        .map(|message| message_item(message, app))
        .collect();

    let mut state = ListState::default();
    match selected {
        Some(index) => state.select(Some(index)),
        None if !conversation.is_empty() => state.select(Some(conversation.len() - 1)),
        None => {}
    }

    let highlight = if selected.is_some() {
        Style::default().bg(app.theme.highlight)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(highlight);
    f.render_stateful_widget(list, area, &mut state);
}

pub fn render_composer(f: &mut Frame<'_>, app: &App, area: Rect, placeholder: &str) {
    let editing = app.composer.target == Some(EditTarget::Message);
    let (text, style) = if app.composer.buffer.is_empty() && !editing {
        (placeholder.to_string(), Style::default().fg(app.theme.text_dim))
    } else if editing {
        (format!("{}▏", app.composer.buffer), Style::default().fg(app.theme.text))
    } else {
        (app.composer.buffer.clone(), Style::default().fg(app.theme.text_dim))
    };
    let border = if editing {
        app.theme.accent
    } else {
        app.theme.border
    };
    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .title("Message")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(input, area);
}

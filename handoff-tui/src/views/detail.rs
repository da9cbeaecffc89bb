//! Ticket detail: metadata, transfer targets and the full conversation.

use crate::state::App;
use crate::theme::{priority_color, session_status_color};
use crate::views::dashboard::render_operators;
use crate::views::helpers::{render_conversation, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(desk) = app.detail.desk.as_ref() else {
        let empty = Paragraph::new("No ticket loaded")
            .block(Block::default().title("Ticket").borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };
    let ticket = desk.ticket();

    let (meta_area, conversation_area) = two_column(area, 35);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(0)])
        .split(meta_area);

    let mut panel = DetailPanel::new("Ticket", Style::default().fg(app.theme.accent))
        .field("ID", ticket.id.clone())
        .styled_field(
            "Status",
            ticket.status.to_string(),
            Style::default().fg(session_status_color(ticket.status, &app.theme)),
        )
        .styled_field(
            "Priority",
            ticket.priority.to_string(),
            Style::default().fg(priority_color(ticket.priority, &app.theme)),
        )
        .field("Assigned", ticket.assigned_to.clone())
        .field("Started", ticket.started.clone());
    if let Some(ended) = &ticket.ended {
        panel = panel.field("Ended", ended.clone());
    }
    if let Some(by) = &ticket.resolved_by {
        panel = panel.field("Resolved by", by.clone());
    }
    if let Some(at) = &ticket.resolved_at {
        panel = panel.field("Resolved at", at.clone());
    }
    panel = panel.field(
        "Flagged",
        ticket.conversation.flagged_count().to_string(),
    );
    if ticket.has_joined {
        panel = panel.field("Live chat", "joined");
    }
    panel.render(f, left[0]);

    render_operators(f, app, left[1]);

    let title = format!("Conversation ({} turns)", ticket.conversation.len());
    render_conversation(
        f,
        app,
        &ticket.conversation,
        &title,
        app.detail.selected_turn,
        conversation_area,
    );
}

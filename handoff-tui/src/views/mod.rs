//! View rendering dispatch.

pub mod chat;
pub mod dashboard;
pub mod detail;
pub mod helpers;

use crate::keys::InputMode;
use crate::nav::View;
use crate::state::App;
use crate::theme::{notification_color, session_status_color};
use crate::widgets::StatusBadge;
use chrono::Utc;
use handoff_client::ConnectionState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// How long a notification replaces the key help in the footer.
const NOTIFICATION_SECS: i64 = 6;

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Dashboard => dashboard::render(f, app, layout[1]),
        View::Detail => detail::render(f, app, layout[1]),
        View::OperatorChat => chat::render_operator_chat(f, app, layout[1]),
        View::UserChat => chat::render_user_chat(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!("{} › {}", app.portal.title(), app.active_view.title()),
        Style::default().fg(app.theme.accent),
    )];

    if let Some(status) = app.status_badge() {
        let badge = StatusBadge {
            status,
            style: Style::default().fg(session_status_color(status, &app.theme)),
        };
        spans.push(Span::raw("  "));
        spans.push(badge.span());
    }

    if let Some(state) = app.connection_state() {
        let (label, color) = match state {
            ConnectionState::Idle => ("idle", app.theme.text_dim),
            ConnectionState::Connecting => ("connecting", app.theme.warning),
            ConnectionState::Connected => ("connected", app.theme.success),
            ConnectionState::Disconnected => ("disconnected", app.theme.error),
        };
        spans.push(Span::styled(
            format!("  WS: {}", label),
            Style::default().fg(color),
        ));
    }

    if let Some(identity) = &app.identity {
        spans.push(Span::styled(
            format!("  {}", identity.display_name()),
            Style::default().fg(app.theme.text_dim),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn help_text(app: &App) -> &'static str {
    if app.input_mode() == InputMode::Editing {
        return "Enter submit • Esc stop editing • Ctrl-c quit";
    }
    match app.active_view {
        View::Dashboard => "j/k move • Tab tab • f priority • / search • Enter open • R refresh • q quit",
        View::Detail => "j/k turn • g flag • r resolve • h/l operator • t transfer • J join • Esc back",
        View::OperatorChat => "i reply • r resolve • Esc leave • q quit",
        View::UserChat => "i type • q quit",
    }
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let fresh = app
        .notifications
        .last()
        .filter(|note| note.is_fresh(Utc::now(), chrono::Duration::seconds(NOTIFICATION_SECS)));
    let (text, style) = if let Some(note) = fresh {
        (
            format!("{}: {}", note.level.label(), note.message),
            Style::default().fg(notification_color(note.level, &app.theme)),
        )
    } else {
        (help_text(app).to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

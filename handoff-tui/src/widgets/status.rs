//! Stat cards and the ticket status badge.

use handoff_core::SessionStatus;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A single dashboard counter.
pub struct StatCard<'a> {
    pub title: &'a str,
    pub value: usize,
    pub style: Style,
}

impl<'a> StatCard<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            self.value.to_string(),
            self.style.add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

/// Inline "Resolved"/"Active" marker.
pub struct StatusBadge {
    pub status: SessionStatus,
    pub style: Style,
}

impl StatusBadge {
    pub fn span(&self) -> Span<'static> {
        let label = if self.status.is_resolved() {
            " Resolved "
        } else {
            " Active "
        };
        Span::styled(label, self.style.add_modifier(Modifier::REVERSED))
    }
}

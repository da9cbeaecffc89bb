//! Dashboard tab strip.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

#[derive(Debug, Clone)]
pub struct FilterOption {
    pub label: String,
    pub count: usize,
    pub active: bool,
}

pub struct FilterBar<'a> {
    pub title: &'a str,
    pub options: &'a [FilterOption],
    /// Right-hand summary of the other filters in effect.
    pub trailing: String,
    pub active_style: Style,
    pub inactive_style: Style,
}

impl<'a> FilterBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans: Vec<Span> = Vec::with_capacity(self.options.len() * 2 + 1);
        for option in self.options {
            let style = if option.active {
                self.active_style.add_modifier(Modifier::BOLD)
            } else {
                self.inactive_style
            };
            spans.push(Span::styled(
                format!(" {} ({}) ", option.label, option.count),
                style,
            ));
            spans.push(Span::raw("│"));
        }
        spans.pop();
        if !self.trailing.is_empty() {
            spans.push(Span::styled(format!("   {}", self.trailing), self.inactive_style));
        }

        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

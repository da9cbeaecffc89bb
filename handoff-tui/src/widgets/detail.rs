//! Label/value panel for ticket metadata.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, String, Style)>,
    pub label_style: Style,
}

impl<'a> DetailPanel<'a> {
    pub fn new(title: &'a str, label_style: Style) -> Self {
        Self {
            title,
            fields: Vec::new(),
            label_style,
        }
    }

    pub fn field(mut self, label: &'a str, value: impl Into<String>) -> Self {
        self.fields.push((label, value.into(), Style::default()));
        self
    }

    /// Add a field whose value is drawn in `style`, e.g. a status color.
    pub fn styled_field(mut self, label: &'a str, value: impl Into<String>, style: Style) -> Self {
        self.fields.push((label, value.into(), style));
        self
    }

    pub fn render(self, f: &mut Frame<'_>, area: Rect) {
        let label_style = self.label_style.add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = self
            .fields
            .into_iter()
            .map(|(label, value, style)| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", label), label_style),
                    Span::styled(value, style),
                ])
            })
            .collect();

        let widget = Paragraph::new(Text::from(lines))
            .block(Block::default().title(self.title).borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(widget, area);
    }
}

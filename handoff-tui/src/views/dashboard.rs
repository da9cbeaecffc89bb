//! Ticket dashboard: stats, tabs, filters, the ticket table and operators.

use crate::nav::Portal;
use crate::state::{App, EditTarget};
use crate::theme::{operator_status_color, priority_color, session_status_color};
use crate::views::helpers::two_column;
use crate::widgets::{DetailPanel, FilterBar, FilterOption, StatCard};
use handoff_core::dashboard::tab_count;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    render_stats(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);

    let (table_area, side_area) = two_column(chunks[2], 65);
    render_table(f, app, table_area);
    render_side(f, app, side_area);
}

fn render_stats(f: &mut Frame<'_>, app: &App, area: Rect) {
    let stats = &app.dashboard.stats;
    let mut cards = vec![
        StatCard {
            title: "Active",
            value: stats.active,
            style: Style::default().fg(app.theme.success),
        },
        StatCard {
            title: "Resolved",
            value: stats.resolved,
            style: Style::default().fg(app.theme.text_dim),
        },
        StatCard {
            title: "Unassigned",
            value: stats.unassigned,
            style: Style::default().fg(app.theme.warning),
        },
        StatCard {
            title: "Operators online",
            value: stats.available_operators,
            style: Style::default().fg(app.theme.info),
        },
    ];
    if app.portal == Portal::Agent {
        cards.insert(
            2,
            StatCard {
                title: "Assigned to me",
                value: stats.assigned_to_me,
                style: Style::default().fg(app.theme.accent),
            },
        );
    }

    let constraints: Vec<Constraint> = cards
        .iter()
        .map(|_| Constraint::Ratio(1, cards.len() as u32))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    for (card, column) in cards.iter().zip(columns.iter()) {
        card.render(f, *column);
    }
}

fn render_tabs(f: &mut Frame<'_>, app: &App, area: Rect) {
    let options: Vec<FilterOption> = app
        .tabs()
        .iter()
        .map(|tab| FilterOption {
            label: tab.title().to_string(),
            count: tab_count(*tab, &app.dashboard.rows, app.identity.as_ref()),
            active: *tab == app.dashboard.filter.tab,
        })
        .collect();

    let query = &app.dashboard.filter.query;
    let searching = app.composer.target == Some(EditTarget::Search);
    let search = if searching {
        format!("Search: {}▏", query)
    } else if query.is_empty() {
        "Search: (press /)".to_string()
    } else {
        format!("Search: {}", query)
    };
    let bar = FilterBar {
        title: "Tickets",
        options: &options,
        trailing: format!("{}   {}", app.dashboard.filter.priority_label(), search),
        active_style: Style::default().fg(app.theme.accent),
        inactive_style: Style::default().fg(app.theme.text_dim),
    };
    bar.render(f, area);
}

fn render_table(f: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = app.visible_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<14}", row.id), Style::default().fg(app.theme.text)),
                Span::styled(
                    format!("{:<10}", row.status.to_string()),
                    Style::default().fg(session_status_color(row.status, &app.theme)),
                ),
                Span::styled(
                    format!("{:<8}", row.priority.to_string()),
                    Style::default().fg(priority_color(row.priority, &app.theme)),
                ),
                Span::styled(
                    format!("{:<22}", row.assigned_to),
                    Style::default().fg(app.theme.text),
                ),
                Span::styled(row.started.clone(), Style::default().fg(app.theme.text_dim)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if let Some(selected) = app.dashboard.selected.as_deref() {
        state.select(rows.iter().position(|row| row.id == selected));
    }

    let title = if rows.is_empty() {
        "No tickets match".to_string()
    } else {
        format!("{} ticket(s)", rows.len())
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(app.theme.highlight).fg(app.theme.accent));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_side(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    let label = Style::default().fg(app.theme.accent);
    let mut panel = DetailPanel::new("Selected", label);
    if let Some(row) = app.selected_row() {
        panel = panel
            .field("Ticket", row.id.clone())
            .styled_field(
                "Status",
                row.status.to_string(),
                Style::default().fg(session_status_color(row.status, &app.theme)),
            )
            .styled_field(
                "Priority",
                row.priority.to_string(),
                Style::default().fg(priority_color(row.priority, &app.theme)),
            )
            .field("Assigned", row.assigned_to.clone())
            .field("Started", row.started.clone());
        if let Some(ended) = &row.ended {
            panel = panel.field("Ended", ended.clone());
        }
    }
    panel.render(f, chunks[0]);

    render_operators(f, app, chunks[1]);
}

pub fn render_operators(f: &mut Frame<'_>, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .dashboard
        .operators
        .operators
        .iter()
        .map(|operator| {
            let status = operator.status();
            let label = operator.status.as_deref().unwrap_or("Unknown");
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(operator_status_color(status, &app.theme))),
                Span::raw(operator.full_name.clone()),
                Span::styled(format!("  {}", label), Style::default().fg(app.theme.text_dim)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(app.detail.selected_operator);

    let title = format!("Operators ({})", app.dashboard.operators.operators.len());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(app.theme.highlight));
    f.render_stateful_widget(list, area, &mut state);
}

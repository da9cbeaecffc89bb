//! Dashboard listing and in-memory filtering.
//!
//! Everything here operates on rows that are already fully loaded: there
//! is no pagination and no server-side query building.

use crate::enums::{DashboardTab, Priority, SessionStatus};
use crate::message::format_timestamp;
use crate::operator::{OperatorIdentity, OperatorsResponse};
use crate::session::SessionSummary;
use crate::{SessionId, Timestamp, UNASSIGNED};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub id: SessionId,
    pub started: String,
    pub ended: Option<String>,
    pub status: SessionStatus,
    pub assigned_to: String,
    pub priority: Priority,
    #[serde(skip)]
    pub started_at: Option<Timestamp>,
}

impl DashboardRow {
    pub fn from_summary(summary: &SessionSummary) -> Self {
        let assigned_to = summary
            .assigned_to
            .clone()
            .or_else(|| summary.user_id.clone())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| UNASSIGNED.to_string());
        Self {
            id: summary.session_id.clone(),
            started: summary
                .started_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
            ended: summary.ended_at.as_deref().map(format_timestamp),
            status: summary.status(),
            assigned_to,
            priority: summary.priority(),
            started_at: summary.started(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_to == UNASSIGNED
    }
}

/// Convert list rows and order them newest first.
///
/// Rows without a parseable start time sink to the bottom in their
/// original relative order.
pub fn rows_from_summaries(summaries: &[SessionSummary]) -> Vec<DashboardRow> {
    let mut rows: Vec<DashboardRow> = summaries.iter().map(DashboardRow::from_summary).collect();
    rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    rows
}

/// Tab, priority and search selection for a dashboard table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub tab: DashboardTab,
    pub priority: Option<Priority>,
    pub query: String,
}

impl DashboardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self, row: &DashboardRow, me: Option<&OperatorIdentity>) -> bool {
        tab_matches(self.tab, row, me)
            && self.priority.map_or(true, |p| row.priority == p)
            && query_matches(&self.query, row)
    }

    pub fn apply<'a>(
        &self,
        rows: &'a [DashboardRow],
        me: Option<&OperatorIdentity>,
    ) -> Vec<&'a DashboardRow> {
        rows.iter().filter(|row| self.matches(row, me)).collect()
    }

    /// Cycle the priority filter: all → High → Medium → Low → all.
    pub fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            None => Some(Priority::High),
            Some(Priority::High) => Some(Priority::Medium),
            Some(Priority::Medium) => Some(Priority::Low),
            Some(Priority::Low) => None,
        };
    }

    pub fn priority_label(&self) -> String {
        match self.priority {
            Some(priority) => format!("{} Priority", priority),
            None => "All Priorities".to_string(),
        }
    }
}

fn tab_matches(tab: DashboardTab, row: &DashboardRow, me: Option<&OperatorIdentity>) -> bool {
    match tab {
        DashboardTab::Active => row.status == SessionStatus::Active,
        DashboardTab::Resolved => row.status == SessionStatus::Resolved,
        DashboardTab::Assigned => match me {
            Some(me) => me.matches(&row.assigned_to),
            None => !row.is_unassigned(),
        },
    }
}

fn query_matches(query: &str, row: &DashboardRow) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    row.id.to_lowercase().contains(&query) || row.assigned_to.to_lowercase().contains(&query)
}

/// Number of rows each tab would show, ignoring priority and search.
pub fn tab_count(
    tab: DashboardTab,
    rows: &[DashboardRow],
    me: Option<&OperatorIdentity>,
) -> usize {
    rows.iter().filter(|row| tab_matches(tab, row, me)).count()
}

/// Overview cards shown above the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub active: usize,
    pub resolved: usize,
    pub unassigned: usize,
    pub assigned_to_me: usize,
    pub available_operators: usize,
}

impl DashboardStats {
    pub fn compute(
        rows: &[DashboardRow],
        operators: &OperatorsResponse,
        me: Option<&OperatorIdentity>,
    ) -> Self {
        Self {
            active: tab_count(DashboardTab::Active, rows, None),
            resolved: tab_count(DashboardTab::Resolved, rows, None),
            unassigned: rows
                .iter()
                .filter(|r| r.status == SessionStatus::Active && r.is_unassigned())
                .count(),
            assigned_to_me: me
                .map(|me| tab_count(DashboardTab::Assigned, rows, Some(me)))
                .unwrap_or(0),
            available_operators: operators.available_count(),
        }
    }
}

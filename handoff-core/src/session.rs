//! Sessions and tickets as fetched from the backend, plus the local
//! working copy the detail views mutate.

use crate::conversation::Conversation;
use crate::enums::{Priority, SessionStatus};
use crate::message::{format_timestamp, HistoryEntry};
use crate::{SessionId, Timestamp, UNASSIGNED};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Operator name recorded when the current user resolves a ticket.
pub const CURRENT_OPERATOR: &str = "Current Operator";

/// One row of `GET /sessions` or `GET /tickets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(alias = "id", alias = "ticket_id")]
    pub session_id: SessionId,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl SessionSummary {
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_resolved(self.resolved || self.ended_at.is_some())
    }

    pub fn priority(&self) -> Priority {
        parse_priority(self.priority.as_deref())
    }

    pub fn started(&self) -> Option<Timestamp> {
        self.started_at.as_deref().and_then(parse_timestamp)
    }
}

/// Body of `GET /sessions/{id}` or `GET /tickets/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(default, alias = "session_id", alias = "ticket_id")]
    pub id: Option<SessionId>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub conversation: Vec<HistoryEntry>,
}

/// Client-local copy of a ticket shown in the detail views.
///
/// Not authoritative: actions update it optimistically and nothing
/// reconciles it against the backend afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: SessionId,
    pub started: String,
    pub ended: Option<String>,
    pub status: SessionStatus,
    pub priority: Priority,
    pub assigned_to: String,
    pub has_joined: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub conversation: Conversation,
}

impl Ticket {
    /// Build from a detail response; `requested_id` fills in a missing id.
    pub fn from_detail(requested_id: &str, detail: SessionDetail) -> Self {
        let priority = parse_priority(detail.priority.as_deref());
        Self {
            id: detail.id.unwrap_or_else(|| requested_id.to_string()),
            started: detail
                .started_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
            ended: detail.ended_at.as_deref().map(format_timestamp),
            status: SessionStatus::from_resolved(detail.resolved),
            priority,
            assigned_to: detail
                .assigned_to
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            has_joined: false,
            resolved_by: detail.resolved_by,
            resolved_at: detail.resolved_at.as_deref().map(format_timestamp),
            conversation: detail
                .conversation
                .into_iter()
                .map(HistoryEntry::into_message)
                .collect(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status.is_resolved()
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_to == UNASSIGNED
    }

    /// Flip Active/Resolved exactly once, stamping resolution fields.
    pub fn toggle_resolved(&mut self, now: &str) -> SessionStatus {
        self.status = self.status.toggled();
        if self.status.is_resolved() {
            self.ended = Some(now.to_string());
            self.resolved_at = Some(now.to_string());
            self.resolved_by = Some(CURRENT_OPERATOR.to_string());
        } else {
            self.ended = None;
            self.resolved_at = None;
            self.resolved_by = None;
        }
        self.status
    }
}

pub(crate) fn parse_priority(raw: Option<&str>) -> Priority {
    raw.and_then(|p| p.parse().ok()).unwrap_or_default()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&chrono::Utc))
}

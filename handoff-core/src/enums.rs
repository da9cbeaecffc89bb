//! Enum types for hand-off entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// MESSAGE ENUMS
// ============================================================================

/// Author role of a conversation turn as rendered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

// ============================================================================
// SESSION ENUMS
// ============================================================================

/// Whether a session still accepts conversation turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Active,
    Resolved,
}

impl SessionStatus {
    pub fn from_resolved(resolved: bool) -> Self {
        if resolved {
            SessionStatus::Resolved
        } else {
            SessionStatus::Active
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SessionStatus::Resolved)
    }

    pub fn toggled(&self) -> Self {
        match self {
            SessionStatus::Active => SessionStatus::Resolved,
            SessionStatus::Resolved => SessionStatus::Active,
        }
    }
}

/// Ticket urgency badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Priority::High, Priority::Medium, Priority::Low]
    }
}

/// Which flavour of backend record a portal works against.
///
/// The backend exposes the same operations under `/sessions` and
/// `/tickets`; only the prefix and the id generator differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Session,
    #[default]
    Ticket,
}

impl RecordKind {
    pub fn path_prefix(&self) -> &'static str {
        match self {
            RecordKind::Session => "sessions",
            RecordKind::Ticket => "tickets",
        }
    }

    pub fn id_endpoint(&self) -> &'static str {
        match self {
            RecordKind::Session => "generate-session-id",
            RecordKind::Ticket => "generate-ticket-id",
        }
    }

    /// JSON field carrying the generated id.
    pub fn id_field(&self) -> &'static str {
        match self {
            RecordKind::Session => "session_id",
            RecordKind::Ticket => "ticket_id",
        }
    }
}

// ============================================================================
// OPERATOR ENUMS
// ============================================================================

/// Presence of a human operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorStatus {
    Available,
    Busy,
    Away,
}

// ============================================================================
// DASHBOARD ENUMS
// ============================================================================

/// Dashboard tab selecting which rows are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DashboardTab {
    #[default]
    Active,
    Assigned,
    Resolved,
}

impl DashboardTab {
    pub fn all() -> &'static [DashboardTab] {
        &[
            DashboardTab::Active,
            DashboardTab::Assigned,
            DashboardTab::Resolved,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            DashboardTab::Active => "Active",
            DashboardTab::Assigned => "Assigned",
            DashboardTab::Resolved => "Resolved",
        }
    }
}

// ============================================================================
// DISPLAY / PARSING
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("Invalid Role: {}", s)),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SessionStatus::Active => "Active",
            SessionStatus::Resolved => "Resolved",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "active" => Ok(SessionStatus::Active),
            "resolved" | "ended" => Ok(SessionStatus::Resolved),
            _ => Err(format!("Invalid SessionStatus: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid Priority: {}", s)),
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            OperatorStatus::Available => "Available",
            OperatorStatus::Busy => "Busy",
            OperatorStatus::Away => "Away",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for OperatorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "available" => Ok(OperatorStatus::Available),
            "busy" => Ok(OperatorStatus::Busy),
            "away" => Ok(OperatorStatus::Away),
            _ => Err(format!("Invalid OperatorStatus: {}", s)),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RecordKind::Session => "session",
            RecordKind::Ticket => "ticket",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "session" | "sessions" => Ok(RecordKind::Session),
            "ticket" | "tickets" => Ok(RecordKind::Ticket),
            _ => Err(format!("Invalid RecordKind: {}", s)),
        }
    }
}

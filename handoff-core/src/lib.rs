//! Handoff Core - Entity Types
//!
//! Data structures shared by the client and the terminal UI. The backend
//! owns every entity here; these types only mirror what it sends and what
//! the UI changes locally.

pub mod api;
pub mod conversation;
pub mod dashboard;
pub mod enums;
pub mod error;
pub mod frames;
pub mod message;
pub mod operator;
pub mod session;

pub use api::{AuthRequest, AuthResponse, ErrorBody, TransferRequest};
pub use conversation::Conversation;
pub use dashboard::{DashboardFilter, DashboardRow, DashboardStats};
pub use enums::{DashboardTab, OperatorStatus, Priority, RecordKind, Role, SessionStatus};
pub use error::{HandoffError, HandoffResult};
pub use frames::{InboundFrame, OutboundFrame, TraceEvent};
pub use message::{display_now, format_timestamp, HandoffInfo, HistoryEntry, Message, ToolCall};
pub use operator::{Operator, OperatorIdentity, OperatorsResponse};
pub use session::{SessionDetail, SessionSummary, Ticket};

/// Backend-issued conversation identifier (12 hex chars in practice).
pub type SessionId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Agent label shown for assistant turns with no agent name.
pub const DEFAULT_AGENT_LABEL: &str = "AI Assistant";

/// Agent label attached to operator-authored turns.
pub const HUMAN_SUPPORT_LABEL: &str = "Human Support";

/// Placeholder assignee for tickets nobody owns yet.
pub const UNASSIGNED: &str = "Unassigned";

/// System notice appended once the backend confirms a human override.
pub const TAKEOVER_NOTICE: &str = "Human support has taken over this conversation.";

/// System notice appended when an operator resolves a live chat.
pub const RESOLVED_NOTICE: &str =
    "This session has been marked as resolved. The chat is now closed.";

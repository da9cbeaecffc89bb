//! Error types for hand-off operations

use thiserror::Error;

/// Failures surfaced by the chat and ticket operations.
///
/// All of them are coarse: nothing distinguishes transient from permanent
/// failure and nothing is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandoffError {
    #[error("WebSocket not connected")]
    NotConnected,

    #[error("No session ID available")]
    NoSessionId,

    #[error("No operator selected")]
    NoOperatorSelected,

    #[error("Operator identity unknown; sign in first")]
    MissingIdentity,

    #[error("Session {id} is resolved")]
    Resolved { id: String },

    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("Failed to load session data")]
    LoadFailed,

    #[error("Backend rejected request ({status}): {detail}")]
    Remote { status: u16, detail: String },
}

pub type HandoffResult<T> = Result<T, HandoffError>;

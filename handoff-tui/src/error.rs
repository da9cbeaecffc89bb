//! Error types for the TUI.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::persistence::PersistenceError;
use handoff_client::ApiClientError;
use handoff_core::HandoffError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("Invalid argument: {0}")]
    Argument(String),
}

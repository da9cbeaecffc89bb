//! Client error types.

use handoff_core::HandoffError;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {detail}")]
    InvalidResponse { status: u16, detail: String },
    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

impl From<tokio_tungstenite::tungstenite::Error> for ApiClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

impl ApiClientError {
    /// Text suitable for a notification: the backend `detail` when the
    /// server supplied one, otherwise the error itself.
    pub fn user_message(&self) -> String {
        match self {
            ApiClientError::InvalidResponse { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Fold into the domain error the chat and ticket operations return.
    pub fn into_handoff(self) -> HandoffError {
        match self {
            ApiClientError::Handoff(err) => err,
            ApiClientError::InvalidResponse { status, detail } => {
                HandoffError::Remote { status, detail }
            }
            other => HandoffError::Remote {
                status: 0,
                detail: other.to_string(),
            },
        }
    }
}

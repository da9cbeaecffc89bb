//! Connection settings for [`crate::HandoffClient`].

use crate::error::ApiClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base such as `http://localhost:8000`; the WebSocket base is
    /// derived from it.
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_ms: 5_000,
        }
    }

    pub fn validate(&self) -> Result<(), ApiClientError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ApiClientError::Config("base_url is required".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ApiClientError::Config(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ApiClientError::Config(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// `http(s)://host` → `ws(s)://host`, without a trailing slash.
    pub fn ws_base_url(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_base_from_http() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(config.ws_base_url(), "ws://localhost:8000");
    }

    #[test]
    fn test_ws_base_from_https() {
        let config = ClientConfig::new("https://support.example.com");
        assert_eq!(config.ws_base_url(), "wss://support.example.com");
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        assert!(ClientConfig::new("localhost:8000").validate().is_err());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("http://localhost:8001").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ClientConfig::new("http://localhost:8000");
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}

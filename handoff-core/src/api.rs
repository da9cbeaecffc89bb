//! Request and response bodies for the backend REST endpoints that are
//! not entity listings.

use crate::SessionId;
use serde::{Deserialize, Serialize};

/// `POST /auth`: exchange an OAuth authorization code for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// `POST /ticket-transfer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    #[serde(rename = "ticketId")]
    pub ticket_id: SessionId,
}

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_uses_camel_case_ticket_id() {
        let body = TransferRequest {
            from: "a@x".to_string(),
            to: "b@x".to_string(),
            ticket_id: "80b74a3e1f4b".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ticketId"], "80b74a3e1f4b");
        assert!(json.get("ticket_id").is_none());
    }

    #[test]
    fn test_auth_response_defaults() {
        let parsed: AuthResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(parsed.success);
        assert!(parsed.email.is_none());
    }
}

//! REST endpoints of the support backend.

use crate::config::ClientConfig;
use crate::error::ApiClientError;
use handoff_core::{
    AuthRequest, AuthResponse, ErrorBody, OperatorsResponse, RecordKind, SessionDetail, SessionId,
    SessionSummary, TransferRequest,
};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /generate-session-id` or `GET /generate-ticket-id`.
    pub async fn generate_id(&self, kind: RecordKind) -> Result<SessionId, ApiClientError> {
        let path = format!("/{}", kind.id_endpoint());
        let body: serde_json::Value = self.get_json(&path).await?;
        body.get(kind.id_field())
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(ApiClientError::MissingField(kind.id_field()))
    }

    pub async fn list(&self, kind: RecordKind) -> Result<Vec<SessionSummary>, ApiClientError> {
        let path = format!("/{}", kind.path_prefix());
        self.get_json(&path).await
    }

    pub async fn get(&self, kind: RecordKind, id: &str) -> Result<SessionDetail, ApiClientError> {
        let path = format!("/{}/{}", kind.path_prefix(), id);
        self.get_json(&path).await
    }

    pub async fn toggle_resolve(&self, kind: RecordKind, id: &str) -> Result<(), ApiClientError> {
        let path = format!("/{}/{}/toggle-resolve", kind.path_prefix(), id);
        self.post_empty(&path).await
    }

    pub async fn flag_turn(
        &self,
        kind: RecordKind,
        id: &str,
        turn_id: &str,
    ) -> Result<(), ApiClientError> {
        let path = format!("/{}/{}/flag/{}", kind.path_prefix(), id, turn_id);
        self.post_empty(&path).await
    }

    /// `POST /override/{id}`: hand the conversation to a human.
    pub async fn enable_override(&self, id: &str) -> Result<(), ApiClientError> {
        let path = format!("/override/{}", id);
        self.post_empty(&path).await
    }

    pub async fn authenticate(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AuthResponse, ApiClientError> {
        let body = AuthRequest {
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
        };
        self.post_json("/auth", &body).await
    }

    pub async fn transfer_ticket(
        &self,
        from: &str,
        to: &str,
        ticket_id: &str,
    ) -> Result<(), ApiClientError> {
        let body = TransferRequest {
            from: from.to_string(),
            to: to.to_string(),
            ticket_id: ticket_id.to_string(),
        };
        let url = format!("{}/ticket-transfer", self.base_url);
        let response = self.client.post(url).json(&body).send().await?;
        check_status(response).await
    }

    pub async fn list_operators(&self) -> Result<OperatorsResponse, ApiClientError> {
        self.get_json("/operators").await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        parse_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        parse_response(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), ApiClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");
        let response = self.client.post(url).send().await?;
        check_status(response).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(error_from_body(status.as_u16(), response.text().await?))
    }
}

/// Success check for endpoints whose body the client ignores.
async fn check_status(response: reqwest::Response) -> Result<(), ApiClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_from_body(status.as_u16(), response.text().await?))
    }
}

fn error_from_body(status: u16, text: String) -> ApiClientError {
    let detail = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.detail,
        Err(_) => text,
    };
    ApiClientError::InvalidResponse { status, detail }
}

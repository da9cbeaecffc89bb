//! In-process stand-in for the support backend.
//!
//! Serves the REST endpoints and both WebSocket channels on a real TCP
//! listener bound to `127.0.0.1:0`, and records every call so tests can
//! assert on traffic.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use handoff_core::{
    AuthRequest, InboundFrame, OperatorsResponse, OutboundFrame, SessionDetail, SessionSummary,
    TransferRequest,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::fixtures;

/// One request the backend saw.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

struct MockState {
    records: Mutex<Vec<SessionDetail>>,
    operators: OperatorsResponse,
    calls: Mutex<Vec<RecordedCall>>,
    received: Mutex<Vec<(String, String)>>,
    fail_actions: AtomicBool,
    user_connections: AtomicUsize,
    operator_connections: AtomicUsize,
    next_id: AtomicUsize,
    operator_feed: broadcast::Sender<String>,
}

impl MockState {
    fn record(&self, method: &'static str, path: String, body: Option<Value>) {
        lock(&self.calls).push(RecordedCall { method, path, body });
    }

    fn failing(&self) -> bool {
        self.fail_actions.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start with the demo tickets and operators.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(fixtures::demo_tickets(), fixtures::demo_operators()).await
    }

    pub async fn start_with(
        records: Vec<SessionDetail>,
        operators: OperatorsResponse,
    ) -> std::io::Result<Self> {
        let (operator_feed, _) = broadcast::channel(64);
        let state = Arc::new(MockState {
            records: Mutex::new(records),
            operators,
            calls: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            fail_actions: AtomicBool::new(false),
            user_connections: AtomicUsize::new(0),
            operator_connections: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            operator_feed,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    /// Number of requests whose path equals `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        lock(&self.state.calls)
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    /// Make every mutating endpoint answer 500.
    pub fn fail_actions(&self, fail: bool) {
        self.state.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub fn user_connections(&self) -> usize {
        self.state.user_connections.load(Ordering::SeqCst)
    }

    pub fn operator_connections(&self) -> usize {
        self.state.operator_connections.load(Ordering::SeqCst)
    }

    /// `(session_id, message)` pairs received over either socket channel.
    pub fn received_messages(&self) -> Vec<(String, String)> {
        lock(&self.state.received).clone()
    }

    /// Push a frame to every connected operator socket.
    pub fn push_operator_frame(&self, frame: &InboundFrame) -> bool {
        match serde_json::to_string(frame) {
            Ok(text) => self.state.operator_feed.send(text).is_ok(),
            Err(_) => false,
        }
    }

    pub fn record(&self, id: &str) -> Option<SessionDetail> {
        lock(&self.state.records)
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Arc<MockState>) -> Router {
    let mut router = Router::new()
        .route("/generate-session-id", get(generate_session_id))
        .route("/generate-ticket-id", get(generate_ticket_id))
        .route("/override/:id", post(enable_override))
        .route("/auth", post(authenticate))
        .route("/ticket-transfer", post(transfer))
        .route("/operators", get(list_operators))
        .route("/ws/:id", get(user_socket))
        .route("/operator/:id", get(operator_socket));
    for prefix in ["sessions", "tickets"] {
        router = router
            .route(&format!("/{}", prefix), get(list_records))
            .route(&format!("/{}/:id", prefix), get(get_record))
            .route(
                &format!("/{}/:id/toggle-resolve", prefix),
                post(toggle_resolve),
            )
            .route(&format!("/{}/:id/flag/:turn_id", prefix), post(flag_turn));
    }
    router.with_state(state)
}

fn failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Simulated backend failure" })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{} not found", what) })),
    )
        .into_response()
}

fn next_hex_id(state: &MockState) -> String {
    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    format!("{:012x}", 0xa1b2_0000_0000usize + n)
}

async fn generate_session_id(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.record("GET", "/generate-session-id".to_string(), None);
    Json(json!({ "session_id": next_hex_id(&state) }))
}

async fn generate_ticket_id(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.record("GET", "/generate-ticket-id".to_string(), None);
    Json(json!({ "ticket_id": next_hex_id(&state) }))
}

async fn list_records(
    State(state): State<Arc<MockState>>,
    uri: axum::http::Uri,
) -> Json<Vec<SessionSummary>> {
    state.record("GET", uri.path().to_string(), None);
    let rows = lock(&state.records)
        .iter()
        .map(|r| SessionSummary {
            session_id: r.id.clone().unwrap_or_default(),
            started_at: r.started_at.clone(),
            ended_at: r.ended_at.clone(),
            resolved: r.resolved,
            assigned_to: r.assigned_to.clone(),
            user_id: None,
            priority: r.priority.clone(),
        })
        .collect();
    Json(rows)
}

async fn get_record(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: axum::http::Uri,
) -> Response {
    state.record("GET", uri.path().to_string(), None);
    let found = lock(&state.records)
        .iter()
        .find(|r| r.id.as_deref() == Some(id.as_str()))
        .cloned();
    match found {
        Some(detail) => Json(detail).into_response(),
        None => not_found("Session"),
    }
}

async fn toggle_resolve(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    uri: axum::http::Uri,
) -> Response {
    state.record("POST", uri.path().to_string(), None);
    if state.failing() {
        return failure();
    }
    let mut records = lock(&state.records);
    match records.iter_mut().find(|r| r.id.as_deref() == Some(id.as_str())) {
        Some(record) => {
            record.resolved = !record.resolved;
            record.ended_at = record
                .resolved
                .then(|| chrono::Utc::now().to_rfc3339());
            Json(json!({ "resolved": record.resolved })).into_response()
        }
        None => not_found("Session"),
    }
}

async fn flag_turn(
    State(state): State<Arc<MockState>>,
    Path((id, turn_id)): Path<(String, String)>,
    uri: axum::http::Uri,
) -> Response {
    state.record("POST", uri.path().to_string(), None);
    if state.failing() {
        return failure();
    }
    let mut records = lock(&state.records);
    let Some(record) = records.iter_mut().find(|r| r.id.as_deref() == Some(id.as_str())) else {
        return not_found("Session");
    };
    for entry in record
        .conversation
        .iter_mut()
        .filter(|e| e.turn_id.as_deref() == Some(turn_id.as_str()))
    {
        entry.flagged = Some(!entry.flagged.unwrap_or(false));
    }
    Json(json!({ "success": true })).into_response()
}

async fn enable_override(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.record("POST", format!("/override/{}", id), None);
    if state.failing() {
        return failure();
    }
    Json(json!({ "override": true })).into_response()
}

async fn authenticate(
    State(state): State<Arc<MockState>>,
    Json(body): Json<AuthRequest>,
) -> Response {
    state.record("POST", "/auth".to_string(), serde_json::to_value(&body).ok());
    if body.code.is_empty() || state.failing() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid authorization code" })),
        )
            .into_response();
    }
    let first = state.operators.operators.first();
    Json(json!({
        "success": true,
        "email": first.map(|op| op.email.clone()),
        "full_name": first.map(|op| op.full_name.clone()),
    }))
    .into_response()
}

async fn transfer(
    State(state): State<Arc<MockState>>,
    Json(body): Json<TransferRequest>,
) -> Response {
    state.record(
        "POST",
        "/ticket-transfer".to_string(),
        serde_json::to_value(&body).ok(),
    );
    if state.failing() {
        return failure();
    }
    let Some(target) = state.operators.find_by_email(&body.to) else {
        return not_found("Operator");
    };
    let mut records = lock(&state.records);
    match records
        .iter_mut()
        .find(|r| r.id.as_deref() == Some(body.ticket_id.as_str()))
    {
        Some(record) => {
            record.assigned_to = Some(target.full_name.clone());
            Json(json!({ "success": true })).into_response()
        }
        None => not_found("Ticket"),
    }
}

async fn list_operators(State(state): State<Arc<MockState>>) -> Json<OperatorsResponse> {
    state.record("GET", "/operators".to_string(), None);
    Json(state.operators.clone())
}

async fn user_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Response {
    state.record("GET", format!("/ws/{}", id), None);
    ws.on_upgrade(move |socket| serve_user(socket, state, id))
}

/// Answer every end-user turn with a hand-off frame and one agent reply.
async fn serve_user(socket: WebSocket, state: Arc<MockState>, id: String) {
    state.user_connections.fetch_add(1, Ordering::SeqCst);
    let (mut sink, mut stream) = socket.split();
    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(frame) = serde_json::from_str::<OutboundFrame>(&text) else {
            continue;
        };
        lock(&state.received).push((id.clone(), frame.message.clone()));

        let replies = [
            InboundFrame::Handoff {
                source: "TriageAgent".to_string(),
                target: "MarketingAgent".to_string(),
            },
            InboundFrame::Message {
                content: format!("You said: {}", frame.message),
                agent: Some("MarketingAgent".to_string()),
            },
        ];
        for reply in replies {
            let Ok(encoded) = serde_json::to_string(&reply) else {
                continue;
            };
            if sink.send(Message::Text(encoded)).await.is_err() {
                return;
            }
        }
    }
}

async fn operator_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Response {
    state.record("GET", format!("/operator/{}", id), None);
    ws.on_upgrade(move |socket| serve_operator(socket, state, id))
}

/// Relay pushed frames to the operator and record what they type.
async fn serve_operator(socket: WebSocket, state: Arc<MockState>, id: String) {
    let mut feed = state.operator_feed.subscribe();
    state.operator_connections.fetch_add(1, Ordering::SeqCst);
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            pushed = feed.recv() => match pushed {
                Ok(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(frame) = serde_json::from_str::<OutboundFrame>(&text) {
                        lock(&state.received).push((id.clone(), frame.message));
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

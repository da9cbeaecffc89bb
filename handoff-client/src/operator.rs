//! Operator takeover of a live conversation.

use crate::chat::{ConnectionState, SendOutcome};
use crate::rest::RestClient;
use crate::ws::{
    spawn_operator_socket, SocketEvent, SocketHandle, SocketId, SocketUpdate, WsClient,
};
use handoff_core::{
    Conversation, HandoffError, HistoryEntry, InboundFrame, Message, OutboundFrame, RecordKind,
    SessionId, HUMAN_SUPPORT_LABEL, RESOLVED_NOTICE, TAKEOVER_NOTICE,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Banner shown when an operator tries to type with no live socket.
pub const NOT_CONNECTED_NOTICE: &str = "WebSocket not connected. Please try again.";

pub const RESOLVE_FAILED_NOTICE: &str = "Failed to resolve session. Please try again.";

#[derive(Debug)]
pub struct OperatorChat {
    kind: RecordKind,
    session_id: SessionId,
    resolved: bool,
    state: ConnectionState,
    conversation: Conversation,
    socket: Option<SocketHandle>,
    error: Option<String>,
    override_enabled: bool,
}

impl OperatorChat {
    pub fn new(kind: RecordKind, session_id: impl Into<SessionId>) -> Self {
        Self {
            kind,
            session_id: session_id.into(),
            resolved: false,
            state: ConnectionState::Idle,
            conversation: Conversation::new(),
            socket: None,
            error: None,
            override_enabled: false,
        }
    }

    /// Fetch the conversation so far.
    ///
    /// A no-op while the socket is held: the local copy then carries the
    /// takeover notice and replies the backend does not return.
    pub async fn load(&mut self, rest: &RestClient) -> Result<(), HandoffError> {
        if self.socket.is_some() {
            debug!(session_id = %self.session_id, "Live socket; keeping local conversation");
            return Ok(());
        }
        match rest.get(self.kind, &self.session_id).await {
            Ok(detail) => {
                self.resolved = detail.resolved;
                self.conversation = detail
                    .conversation
                    .into_iter()
                    .map(HistoryEntry::into_message)
                    .collect();
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "Failed to load session");
                self.error = Some(HandoffError::LoadFailed.to_string());
                Err(HandoffError::LoadFailed)
            }
        }
    }

    /// Open the operator socket; the override request follows once it is up.
    pub fn join<E>(
        &mut self,
        ws: &WsClient,
        rest: &RestClient,
        sender: &mpsc::Sender<E>,
    ) -> Result<(), HandoffError>
    where
        E: From<SocketUpdate> + Send + 'static,
    {
        if self.resolved {
            return Err(HandoffError::Resolved {
                id: self.session_id.clone(),
            });
        }
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Ok(());
        }
        info!(session_id = %self.session_id, "Operator joining chat");
        self.socket = Some(spawn_operator_socket(
            ws.clone(),
            rest.clone(),
            self.session_id.clone(),
            sender.clone(),
        ));
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    pub fn send(&mut self, text: &str) -> Result<SendOutcome, HandoffError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        if self.resolved {
            return Err(HandoffError::Resolved {
                id: self.session_id.clone(),
            });
        }
        let socket = match (&self.socket, self.state) {
            (Some(socket), ConnectionState::Connected) => socket,
            _ => {
                self.error = Some(NOT_CONNECTED_NOTICE.to_string());
                return Err(HandoffError::NotConnected);
            }
        };
        if let Err(err) = socket.send(OutboundFrame::new(text)) {
            self.error = Some(NOT_CONNECTED_NOTICE.to_string());
            self.state = ConnectionState::Disconnected;
            return Err(err);
        }
        self.conversation
            .push(Message::assistant(text, HUMAN_SUPPORT_LABEL).stamped_now());
        self.error = None;
        Ok(SendOutcome::Sent)
    }

    /// True when `socket` is the live socket of this chat.
    pub fn owns(&self, socket: SocketId) -> bool {
        self.socket_id() == Some(socket)
    }

    pub fn socket_id(&self) -> Option<SocketId> {
        self.socket.as_ref().map(SocketHandle::id)
    }

    /// Apply an update from the shared channel, dropping those left over
    /// from a socket this chat no longer holds.
    pub fn handle(&mut self, update: &SocketUpdate) {
        if self.owns(update.socket) {
            self.apply(&update.event);
        } else {
            debug!(
                session_id = %self.session_id,
                socket = %update.socket,
                from_session = %update.session_id,
                "Dropping event from a stale socket"
            );
        }
    }

    /// Apply an event known to come from this chat's socket.
    pub fn apply(&mut self, event: &SocketEvent) {
        match event {
            SocketEvent::Opened { .. } => {
                self.state = ConnectionState::Connected;
                self.error = None;
            }
            SocketEvent::OverrideEnabled => {
                self.override_enabled = true;
                self.conversation
                    .push(Message::system(TAKEOVER_NOTICE).stamped_now());
            }
            SocketEvent::OverrideFailed(reason) => {
                warn!(session_id = %self.session_id, reason = %reason, "Override not enabled");
            }
            SocketEvent::Frame(frame @ InboundFrame::TraceEvent { .. }) => {
                if let Some(message) = frame.to_message() {
                    self.conversation.push(message.stamped_now());
                }
            }
            SocketEvent::Frame(_) => {}
            SocketEvent::Closed { .. } => {
                self.state = ConnectionState::Disconnected;
                self.socket = None;
            }
            SocketEvent::Error { message } => {
                warn!(session_id = %self.session_id, error = %message, "Operator socket error");
                self.state = ConnectionState::Disconnected;
                self.socket = None;
            }
        }
    }

    /// Resolve the session and close the chat.
    pub async fn resolve(&mut self, rest: &RestClient) -> Result<(), HandoffError> {
        match rest.toggle_resolve(self.kind, &self.session_id).await {
            Ok(()) => {
                info!(session_id = %self.session_id, "Session resolved by operator");
                self.conversation
                    .push(Message::system(RESOLVED_NOTICE).stamped_now());
                self.resolved = true;
                if let Some(socket) = self.socket.take() {
                    socket.close();
                }
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "Failed to resolve session");
                self.error = Some(RESOLVE_FAILED_NOTICE.to_string());
                Err(err.into_handoff())
            }
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn override_enabled(&self) -> bool {
        self.override_enabled
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::{Role, TraceEvent};

    #[test]
    fn test_send_before_join_sets_banner() {
        let mut chat = OperatorChat::new(RecordKind::Ticket, "80b74a3e1f4b");
        assert_eq!(chat.send("hello"), Err(HandoffError::NotConnected));
        assert_eq!(chat.error(), Some(NOT_CONNECTED_NOTICE));
        assert!(chat.conversation().is_empty());
    }

    #[test]
    fn test_blank_send_ignored_even_when_disconnected() {
        let mut chat = OperatorChat::new(RecordKind::Ticket, "80b74a3e1f4b");
        assert_eq!(chat.send(" \n"), Ok(SendOutcome::Ignored));
        assert!(chat.error().is_none());
    }

    #[test]
    fn test_override_enabled_appends_notice_once_per_event() {
        let mut chat = OperatorChat::new(RecordKind::Ticket, "80b74a3e1f4b");
        chat.apply(&SocketEvent::OverrideEnabled);
        let last = chat.conversation().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert_eq!(last.content, TAKEOVER_NOTICE);
        assert!(chat.override_enabled());
    }

    #[test]
    fn test_only_user_trace_events_append() {
        let mut chat = OperatorChat::new(RecordKind::Ticket, "80b74a3e1f4b");
        chat.apply(&SocketEvent::Frame(InboundFrame::Message {
            content: "agent text".to_string(),
            agent: None,
        }));
        chat.apply(&SocketEvent::Frame(InboundFrame::TraceEvent {
            trace: TraceEvent {
                role: "user".to_string(),
                content: "still broken".to_string(),
            },
        }));
        assert_eq!(chat.conversation().len(), 1);
        assert_eq!(chat.conversation().as_slice()[0].role, Role::User);
    }
}

//! End-user chat with a lazily opened socket.
//!
//! Mounting the chat only reserves an id. The socket opens on the first
//! non-empty send, and that first message goes out as soon as it is up.

use crate::error::ApiClientError;
use crate::rest::RestClient;
use crate::ws::{
    spawn_socket, SocketChannel, SocketEvent, SocketHandle, SocketId, SocketUpdate, WsClient,
};
use handoff_core::{
    Conversation, HandoffError, InboundFrame, Message, OutboundFrame, RecordKind, SessionId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// What a call to [`UserChat::send`] did with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// First message: the socket is being opened and the message is pending.
    Connecting,
    /// Socket still opening; queued behind the pending message.
    Queued,
    Sent,
}

#[derive(Debug, Default)]
pub struct UserChat {
    kind: RecordKind,
    session_id: Option<SessionId>,
    state: ConnectionState,
    conversation: Conversation,
    awaiting_reply: bool,
    socket: Option<SocketHandle>,
}

impl UserChat {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Chat bound to an id that was obtained elsewhere.
    pub fn with_session_id(kind: RecordKind, session_id: impl Into<SessionId>) -> Self {
        Self {
            kind,
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Reserve a fresh id from the backend. No socket is opened.
    pub async fn initialize(&mut self, rest: &RestClient) -> Result<&str, ApiClientError> {
        match rest.generate_id(self.kind).await {
            Ok(id) => {
                info!(session_id = %id, kind = %self.kind, "Chat id generated");
                Ok(self.session_id.insert(id).as_str())
            }
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "Failed to generate chat id");
                Err(err)
            }
        }
    }

    pub fn send<E>(
        &mut self,
        text: &str,
        ws: &WsClient,
        sender: &mpsc::Sender<E>,
    ) -> Result<SendOutcome, HandoffError>
    where
        E: From<SocketUpdate> + Send + 'static,
    {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let session_id = self.session_id.clone().ok_or(HandoffError::NoSessionId)?;

        self.conversation.push(Message::user(text).stamped_now());
        self.awaiting_reply = true;
        let frame = OutboundFrame::new(text);

        match self.state {
            ConnectionState::Idle => {
                debug!(session_id = %session_id, "Opening chat socket on first send");
                let handle = spawn_socket(ws.clone(), SocketChannel::User, session_id, sender.clone());
                handle.send(frame)?;
                self.socket = Some(handle);
                self.state = ConnectionState::Connecting;
                Ok(SendOutcome::Connecting)
            }
            ConnectionState::Connecting => {
                self.push_frame(frame)?;
                Ok(SendOutcome::Queued)
            }
            ConnectionState::Connected => {
                self.push_frame(frame)?;
                Ok(SendOutcome::Sent)
            }
            ConnectionState::Disconnected => {
                self.awaiting_reply = false;
                Err(HandoffError::NotConnected)
            }
        }
    }

    fn push_frame(&mut self, frame: OutboundFrame) -> Result<(), HandoffError> {
        let result = self
            .socket
            .as_ref()
            .ok_or(HandoffError::NotConnected)
            .and_then(|socket| socket.send(frame));
        if result.is_err() {
            self.state = ConnectionState::Disconnected;
            self.awaiting_reply = false;
        }
        result
    }

    /// True when `socket` is the live socket of this chat.
    pub fn owns(&self, socket: SocketId) -> bool {
        self.socket_id() == Some(socket)
    }

    pub fn socket_id(&self) -> Option<SocketId> {
        self.socket.as_ref().map(SocketHandle::id)
    }

    /// Apply an update from the shared channel, dropping those from a
    /// socket this chat has already closed.
    pub fn handle(&mut self, update: &SocketUpdate) {
        if self.owns(update.socket) {
            self.apply(&update.event);
        } else {
            debug!(socket = %update.socket, session_id = %update.session_id, "Dropping event from a stale socket");
        }
    }

    /// Apply an event known to come from this chat's socket.
    pub fn apply(&mut self, event: &SocketEvent) {
        match event {
            SocketEvent::Opened { .. } => self.state = ConnectionState::Connected,
            SocketEvent::Frame(frame) => {
                self.awaiting_reply = false;
                if let InboundFrame::Handoff { source, target } = frame {
                    debug!(source = %source, target = %target, "Agent hand-off");
                }
                if let Some(message) = frame.to_message() {
                    self.conversation.push(message.stamped_now());
                }
            }
            SocketEvent::Closed { reason } => {
                debug!(reason = %reason, "Chat socket closed");
                self.disconnect();
            }
            SocketEvent::Error { message } => {
                warn!(error = %message, "Chat socket error");
                self.disconnect();
            }
            SocketEvent::OverrideEnabled | SocketEvent::OverrideFailed(_) => {}
        }
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.awaiting_reply = false;
        self.socket = None;
    }

    /// Close the socket, if any, as when the chat is unmounted.
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        if self.state != ConnectionState::Idle {
            self.state = ConnectionState::Disconnected;
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use handoff_core::Role;

    fn unreachable_ws() -> WsClient {
        WsClient::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap()
    }

    #[tokio::test]
    async fn test_blank_send_is_ignored() {
        let mut chat = UserChat::with_session_id(RecordKind::Session, "abc");
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        let outcome = chat.send("   ", &unreachable_ws(), &tx).unwrap();
        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(chat.conversation().is_empty());
        assert_eq!(chat.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_send_without_id_fails() {
        let mut chat = UserChat::new(RecordKind::Session);
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        assert_eq!(
            chat.send("hi", &unreachable_ws(), &tx),
            Err(HandoffError::NoSessionId)
        );
        assert!(chat.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_first_send_connects_then_queues() {
        let mut chat = UserChat::with_session_id(RecordKind::Session, "abc");
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        let ws = unreachable_ws();
        assert_eq!(chat.send("hi", &ws, &tx), Ok(SendOutcome::Connecting));
        assert_eq!(chat.state(), ConnectionState::Connecting);
        assert!(chat.awaiting_reply());
        assert_eq!(chat.send("again", &ws, &tx), Ok(SendOutcome::Queued));
        assert_eq!(chat.conversation().len(), 2);
    }

    #[test]
    fn test_frames_update_state_and_conversation() {
        let mut chat = UserChat::with_session_id(RecordKind::Session, "abc");
        chat.apply(&SocketEvent::Opened {
            channel: SocketChannel::User,
            session_id: "abc".to_string(),
        });
        assert!(chat.is_connected());

        chat.apply(&SocketEvent::Frame(InboundFrame::Handoff {
            source: "TriageAgent".to_string(),
            target: "MarketingAgent".to_string(),
        }));
        assert!(chat.conversation().is_empty());

        chat.apply(&SocketEvent::Frame(InboundFrame::Message {
            content: "How can I assist you today?".to_string(),
            agent: Some("TriageAgent".to_string()),
        }));
        let last = chat.conversation().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.agent.as_deref(), Some("TriageAgent"));
        assert!(last.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_disconnected_send_appends_then_errors() {
        let mut chat = UserChat::with_session_id(RecordKind::Session, "abc");
        chat.apply(&SocketEvent::Closed {
            reason: "connection closed".to_string(),
        });
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        assert_eq!(
            chat.send("anyone?", &unreachable_ws(), &tx),
            Err(HandoffError::NotConnected)
        );
        assert_eq!(chat.conversation().len(), 1);
        assert!(!chat.awaiting_reply());
    }

    #[tokio::test]
    async fn test_updates_from_a_closed_socket_are_dropped() {
        let mut chat = UserChat::with_session_id(RecordKind::Session, "abc");
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        chat.send("hi", &unreachable_ws(), &tx).unwrap();
        let old = chat.socket_id().unwrap();
        assert!(chat.owns(old));

        chat.close();
        chat.handle(&SocketUpdate {
            socket: old,
            session_id: "abc".to_string(),
            event: SocketEvent::Opened {
                channel: SocketChannel::User,
                session_id: "abc".to_string(),
            },
        });
        assert!(!chat.owns(old));
        assert_eq!(chat.state(), ConnectionState::Disconnected);
    }
}

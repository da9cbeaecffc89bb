//! WebSocket channels and the per-socket task.
//!
//! Each open socket is owned by one spawned task. Callers talk to it
//! through a [`SocketHandle`] and hear back through an `mpsc` channel of
//! their own event type. Every event is tagged with the [`SocketId`] of the
//! task that produced it, since several sockets may share one channel over
//! a session. Nothing here reconnects: once a socket closes it stays
//! closed.

use crate::config::ClientConfig;
use crate::error::ApiClientError;
use crate::rest::RestClient;
use futures_util::{SinkExt, StreamExt};
use handoff_core::{HandoffError, InboundFrame, OutboundFrame, SessionId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

pub type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one socket task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    fn next() -> Self {
        Self(NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of a conversation a socket speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketChannel {
    /// End-user chat, `/ws/{id}`.
    User,
    /// Operator takeover, `/operator/{id}`.
    Operator,
}

impl SocketChannel {
    fn path_segment(&self) -> &'static str {
        match self {
            SocketChannel::User => "ws",
            SocketChannel::Operator => "operator",
        }
    }
}

impl fmt::Display for SocketChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Lifecycle and traffic reported by a socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened {
        channel: SocketChannel,
        session_id: SessionId,
    },
    Frame(InboundFrame),
    /// The backend accepted `POST /override/{id}`.
    OverrideEnabled,
    OverrideFailed(String),
    Closed {
        reason: String,
    },
    Error {
        message: String,
    },
}

/// A [`SocketEvent`] tagged with the socket task it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketUpdate {
    pub socket: SocketId,
    pub session_id: SessionId,
    pub event: SocketEvent,
}

#[derive(Clone)]
pub struct WsClient {
    endpoint: String,
}

impl WsClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        config.validate()?;
        Ok(Self {
            endpoint: config.ws_base_url(),
        })
    }

    pub fn url(&self, channel: SocketChannel, session_id: &str) -> String {
        format!("{}/{}/{}", self.endpoint, channel.path_segment(), session_id)
    }

    pub async fn connect(
        &self,
        channel: SocketChannel,
        session_id: &str,
    ) -> Result<SocketStream, ApiClientError> {
        let url = self.url(channel, session_id);
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(stream)
    }
}

#[derive(Debug)]
enum Command {
    Send(OutboundFrame),
    Close,
}

/// Write side of a running socket task.
///
/// Frames sent before the socket opens are held in order and flushed once
/// it does. Dropping the last handle closes the socket.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: SocketId,
    commands: mpsc::UnboundedSender<Command>,
}

impl SocketHandle {
    /// Tag carried by every [`SocketUpdate`] this socket emits.
    pub fn id(&self) -> SocketId {
        self.id
    }

    pub fn send(&self, frame: OutboundFrame) -> Result<(), HandoffError> {
        self.commands
            .send(Command::Send(frame))
            .map_err(|_| HandoffError::NotConnected)
    }

    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// True once the socket task has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Open `channel` for `session_id` in the background.
pub fn spawn_socket<E>(
    ws: WsClient,
    channel: SocketChannel,
    session_id: SessionId,
    sender: mpsc::Sender<E>,
) -> SocketHandle
where
    E: From<SocketUpdate> + Send + 'static,
{
    spawn_task(ws, channel, session_id, None, sender)
}

/// Open the operator channel and request the human override once it is up.
pub fn spawn_operator_socket<E>(
    ws: WsClient,
    rest: RestClient,
    session_id: SessionId,
    sender: mpsc::Sender<E>,
) -> SocketHandle
where
    E: From<SocketUpdate> + Send + 'static,
{
    spawn_task(ws, SocketChannel::Operator, session_id, Some(rest), sender)
}

fn spawn_task<E>(
    ws: WsClient,
    channel: SocketChannel,
    session_id: SessionId,
    override_via: Option<RestClient>,
    sender: mpsc::Sender<E>,
) -> SocketHandle
where
    E: From<SocketUpdate> + Send + 'static,
{
    let id = SocketId::next();
    let (commands, queue) = mpsc::unbounded_channel();
    let events = Emitter {
        sender,
        socket: id,
        session_id: session_id.clone(),
    };
    tokio::spawn(run_socket(ws, channel, session_id, override_via, queue, events));
    SocketHandle { id, commands }
}

/// Sending half of the caller's channel, bound to one socket task.
struct Emitter<E> {
    sender: mpsc::Sender<E>,
    socket: SocketId,
    session_id: SessionId,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            socket: self.socket,
            session_id: self.session_id.clone(),
        }
    }
}

impl<E: From<SocketUpdate>> Emitter<E> {
    async fn emit(&self, event: SocketEvent) {
        let update = SocketUpdate {
            socket: self.socket,
            session_id: self.session_id.clone(),
            event,
        };
        let _ = self.sender.send(E::from(update)).await;
    }
}

async fn run_socket<E>(
    ws: WsClient,
    channel: SocketChannel,
    session_id: SessionId,
    override_via: Option<RestClient>,
    mut queue: mpsc::UnboundedReceiver<Command>,
    events: Emitter<E>,
) where
    E: From<SocketUpdate> + Send + 'static,
{
    let socket = match ws.connect(channel, &session_id).await {
        Ok(socket) => socket,
        Err(err) => {
            warn!(session_id = %session_id, channel = %channel, error = %err, "WebSocket connect failed");
            events
                .emit(SocketEvent::Error {
                    message: err.to_string(),
                })
                .await;
            return;
        }
    };

    info!(session_id = %session_id, channel = %channel, socket = %events.socket, "WebSocket connected");
    events
        .emit(SocketEvent::Opened {
            channel,
            session_id: session_id.clone(),
        })
        .await;

    // Every handle dropped while connecting: the caller has left this chat.
    let abandoned = queue.is_closed();
    if abandoned {
        debug!(session_id = %session_id, "Handle dropped before open; skipping override");
    }

    if let Some(rest) = override_via.filter(|_| !abandoned) {
        let events = events.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            let event = match rest.enable_override(&session_id).await {
                Ok(()) => {
                    info!(session_id = %session_id, "Human override enabled");
                    SocketEvent::OverrideEnabled
                }
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "Failed to enable override");
                    SocketEvent::OverrideFailed(err.user_message())
                }
            };
            events.emit(event).await;
        });
    }

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            command = queue.recv() => match command {
                Some(Command::Send(frame)) => {
                    let text = match frame.encode() {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(session_id = %session_id, error = %err, "Dropping unencodable frame");
                            continue;
                        }
                    };
                    if let Err(err) = sink.send(Message::Text(text)).await {
                        warn!(session_id = %session_id, error = %err, "WebSocket send failed");
                        events.emit(SocketEvent::Error { message: err.to_string() }).await;
                        break;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = sink.close().await;
                    events.emit(SocketEvent::Closed { reason: "closed by client".to_string() }).await;
                    break;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => match InboundFrame::decode(&text) {
                    Ok(frame) => events.emit(SocketEvent::Frame(frame)).await,
                    Err(err) => {
                        warn!(session_id = %session_id, error = %err, "Ignoring undecodable frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    events.emit(SocketEvent::Closed { reason: "connection closed".to_string() }).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(session_id = %session_id, error = %err, "WebSocket receive error");
                    events.emit(SocketEvent::Error { message: err.to_string() }).await;
                    break;
                }
            },
        }
    }

    debug!(session_id = %session_id, channel = %channel, "WebSocket task finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WsClient {
        WsClient::new(&ClientConfig::new("http://localhost:8000")).unwrap()
    }

    #[test]
    fn test_user_channel_url() {
        assert_eq!(
            client().url(SocketChannel::User, "80b74a3e1f4b"),
            "ws://localhost:8000/ws/80b74a3e1f4b"
        );
    }

    #[test]
    fn test_operator_channel_url() {
        assert_eq!(
            client().url(SocketChannel::Operator, "80b74a3e1f4b"),
            "ws://localhost:8000/operator/80b74a3e1f4b"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_reports_error_and_closes_handle() {
        let ws = WsClient::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let (tx, mut rx) = mpsc::channel::<SocketUpdate>(4);
        let handle = spawn_socket(ws, SocketChannel::User, "abc".to_string(), tx);

        let update = rx.recv().await.unwrap();
        assert!(matches!(update.event, SocketEvent::Error { .. }));
        assert_eq!(update.socket, handle.id());
        assert_eq!(update.session_id, "abc");
        assert!(rx.recv().await.is_none());
        assert!(handle.is_closed());
        assert_eq!(
            handle.send(OutboundFrame::new("hi")),
            Err(HandoffError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_each_socket_gets_its_own_id() {
        let ws = WsClient::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let (tx, _rx) = mpsc::channel::<SocketUpdate>(4);
        let first = spawn_socket(ws.clone(), SocketChannel::User, "abc".to_string(), tx.clone());
        let second = spawn_socket(ws, SocketChannel::User, "abc".to_string(), tx);
        assert_ne!(first.id(), second.id());
    }
}

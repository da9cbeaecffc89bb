//! Handoff Client
//!
//! REST and WebSocket access to the support backend plus the stateful
//! pieces each portal drives: the end-user chat, the operator takeover and
//! the ticket actions.

pub mod chat;
pub mod config;
pub mod error;
pub mod operator;
pub mod rest;
pub mod ticket;
pub mod ws;

pub use chat::{ConnectionState, SendOutcome, UserChat};
pub use config::ClientConfig;
pub use error::ApiClientError;
pub use operator::OperatorChat;
pub use rest::RestClient;
pub use ticket::{OptimisticUpdate, TicketDesk};
pub use ws::{
    spawn_operator_socket, spawn_socket, SocketChannel, SocketEvent, SocketHandle, SocketId,
    SocketUpdate, WsClient,
};

/// REST and WebSocket clients for one backend.
#[derive(Clone)]
pub struct HandoffClient {
    rest: RestClient,
    ws: WsClient,
}

impl HandoffClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let rest = RestClient::new(config)?;
        let ws = WsClient::new(config)?;
        Ok(Self { rest, ws })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }
}

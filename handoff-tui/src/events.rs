//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use handoff_client::SocketUpdate;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    Socket(SocketUpdate),
    ApiError(String),
}

impl From<SocketUpdate> for TuiEvent {
    fn from(update: SocketUpdate) -> Self {
        TuiEvent::Socket(update)
    }
}

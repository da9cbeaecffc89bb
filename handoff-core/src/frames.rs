//! WebSocket Frame Types
//!
//! Frames exchanged with the backend on the end-user channel
//! (`/ws/{session_id}`) and the operator channel (`/operator/{session_id}`).

use crate::enums::Role;
use crate::error::HandoffError;
use crate::message::Message;
use crate::DEFAULT_AGENT_LABEL;
use serde::{Deserialize, Serialize};

/// A frame pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// An AI agent replied.
    Message {
        /// Reply text
        content: String,
        /// Name of the agent that produced it
        #[serde(default)]
        agent: Option<String>,
    },

    /// Control moved from one AI agent to another.
    Handoff {
        /// Agent handing off
        source: String,
        /// Agent receiving control
        target: String,
    },

    /// Backend notice for the conversation.
    System {
        /// Notice text
        content: String,
    },

    /// Live relay of an end-user turn to an operator.
    TraceEvent {
        /// The relayed turn
        trace: TraceEvent,
    },

    /// Any frame type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Turn carried by a `trace_event` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl InboundFrame {
    pub fn decode(text: &str) -> Result<Self, HandoffError> {
        serde_json::from_str(text).map_err(|e| HandoffError::InvalidFrame {
            reason: e.to_string(),
        })
    }

    /// The message this frame appends, if any.
    ///
    /// Hand-offs and unknown frames never change the conversation; trace
    /// events only do when they relay an end-user turn.
    pub fn to_message(&self) -> Option<Message> {
        match self {
            InboundFrame::Message { content, agent } => Some(Message::assistant(
                content.clone(),
                agent.clone().unwrap_or_else(|| DEFAULT_AGENT_LABEL.to_string()),
            )),
            InboundFrame::System { content } => Some(Message::system(content.clone())),
            InboundFrame::TraceEvent { trace } => match trace.role.parse::<Role>() {
                Ok(Role::User) => Some(Message::user(trace.content.clone())),
                _ => None,
            },
            InboundFrame::Handoff { .. } | InboundFrame::Unknown => None,
        }
    }
}

/// A frame sent to the backend: one user or operator turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: String,
}

impl OutboundFrame {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn encode(&self) -> Result<String, HandoffError> {
        serde_json::to_string(self).map_err(|e| HandoffError::InvalidFrame {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_frame_becomes_assistant_turn() {
        let frame = InboundFrame::decode(r#"{"type":"message","content":"X","agent":"A"}"#).unwrap();
        let message = frame.to_message().unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "X");
        assert_eq!(message.agent.as_deref(), Some("A"));
    }

    #[test]
    fn test_handoff_frame_appends_nothing() {
        let frame = InboundFrame::decode(
            r#"{"type":"handoff","source":"TriageAgent","target":"MarketingAgent"}"#,
        )
        .unwrap();
        assert!(matches!(frame, InboundFrame::Handoff { .. }));
        assert!(frame.to_message().is_none());
    }

    #[test]
    fn test_system_frame_becomes_system_turn() {
        let frame = InboundFrame::decode(r#"{"type":"system","content":"paused"}"#).unwrap();
        assert_eq!(frame.to_message(), Some(Message::system("paused")));
    }

    #[test]
    fn test_trace_event_user_only() {
        let user = InboundFrame::decode(
            r#"{"type":"trace_event","trace":{"role":"user","content":"still broken"}}"#,
        )
        .unwrap();
        assert_eq!(user.to_message(), Some(Message::user("still broken")));

        let agent = InboundFrame::decode(
            r#"{"type":"trace_event","trace":{"role":"assistant","content":"hello"}}"#,
        )
        .unwrap();
        assert!(agent.to_message().is_none());
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        let frame = InboundFrame::decode(r#"{"type":"typing"}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unknown);
    }

    #[test]
    fn test_garbage_is_invalid_frame() {
        assert!(matches!(
            InboundFrame::decode("not json"),
            Err(HandoffError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_outbound_shape() {
        let encoded = OutboundFrame::new("hi").encode().unwrap();
        assert_eq!(encoded, r#"{"message":"hi"}"#);
    }
}

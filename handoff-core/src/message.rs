//! Conversation turns and the history records they are built from.

use crate::enums::Role;
use crate::{DEFAULT_AGENT_LABEL, HUMAN_SUPPORT_LABEL};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Tool invocation attached to an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub output: serde_json::Value,
}

/// Agent-to-agent transfer recorded on a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffInfo {
    pub from: String,
    pub to: String,
}

/// A single rendered conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffInfo>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            agent: None,
            timestamp: None,
            flagged: false,
            turn_id: None,
            tool_call: None,
            handoff: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, agent: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Assistant, content);
        message.agent = Some(agent.into());
        message
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Stamp with the current time as RFC 3339.
    pub fn stamped_now(self) -> Self {
        self.with_timestamp(chrono::Utc::now().to_rfc3339())
    }

    pub fn with_turn_id(mut self, turn_id: impl Into<String>) -> Self {
        self.turn_id = Some(turn_id.into());
        self
    }

    /// Author label as shown next to the bubble.
    pub fn sender_label(&self) -> &str {
        match self.role {
            Role::User => "User",
            Role::System => "System",
            Role::Assistant => self.agent.as_deref().unwrap_or(DEFAULT_AGENT_LABEL),
        }
    }

    pub fn is_human_support(&self) -> bool {
        self.role == Role::Assistant && self.agent.as_deref() == Some(HUMAN_SUPPORT_LABEL)
    }

    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default()
    }
}

/// A turn as stored by the backend in `conversation[]`.
///
/// The backend uses its own role vocabulary (`agent`, `human`), which is
/// folded into [`Role`] by [`HistoryEntry::into_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub flagged: Option<bool>,
    #[serde(default)]
    pub turn_id: Option<String>,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
    #[serde(default)]
    pub handoff: Option<HandoffInfo>,
}

impl HistoryEntry {
    pub fn into_message(self) -> Message {
        let role_token = self
            .role
            .as_deref()
            .map(|r| r.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let (role, agent) = match role_token.as_str() {
            "user" => (Role::User, None),
            "agent" | "assistant" => (
                Role::Assistant,
                Some(self.agent.unwrap_or_else(|| DEFAULT_AGENT_LABEL.to_string())),
            ),
            "human" => (Role::Assistant, Some(HUMAN_SUPPORT_LABEL.to_string())),
            _ => (Role::System, None),
        };
        Message {
            role,
            content: self.content,
            agent,
            timestamp: self.timestamp,
            flagged: self.flagged.unwrap_or(false),
            turn_id: self.turn_id,
            tool_call: self.tool_call,
            handoff: self.handoff,
        }
    }
}

/// Current local time in the display format.
pub fn display_now() -> String {
    Local::now().format(DISPLAY_FORMAT).to_string()
}

const DISPLAY_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Render a backend timestamp as `dd/mm/YYYY, HH:MM:SS` local time.
///
/// Anything that is not RFC 3339 is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format(DISPLAY_FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Option<&str>, agent: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            role: role.map(str::to_string),
            content: "hi".to_string(),
            agent: agent.map(str::to_string),
            timestamp: None,
            flagged: None,
            turn_id: Some("t1".to_string()),
            tool_call: None,
            handoff: None,
        }
    }

    #[test]
    fn test_history_agent_role_defaults_label() {
        let message = entry(Some("agent"), None).into_message();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.agent.as_deref(), Some(DEFAULT_AGENT_LABEL));
    }

    #[test]
    fn test_history_agent_keeps_name() {
        let message = entry(Some("agent"), Some("TriageAgent")).into_message();
        assert_eq!(message.sender_label(), "TriageAgent");
    }

    #[test]
    fn test_history_human_role_is_human_support() {
        let message = entry(Some("human"), None).into_message();
        assert!(message.is_human_support());
    }

    #[test]
    fn test_history_unknown_role_is_system() {
        assert_eq!(entry(Some("tool"), None).into_message().role, Role::System);
        assert_eq!(entry(None, None).into_message().role, Role::System);
    }

    #[test]
    fn test_history_keeps_turn_id_and_flag() {
        let mut raw = entry(Some("user"), None);
        raw.flagged = Some(true);
        let message = raw.into_message();
        assert!(message.flagged);
        assert_eq!(message.turn_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_format_timestamp_passthrough() {
        assert_eq!(format_timestamp("02/04/2025, 16:20:28"), "02/04/2025, 16:20:28");
    }

    #[test]
    fn test_format_timestamp_rfc3339() {
        let formatted = format_timestamp("2025-04-02T16:20:28+00:00");
        assert!(formatted.contains("2025"));
        assert!(formatted.contains(", "));
    }

    #[test]
    fn test_message_deserializes_without_optional_fields() {
        let message: Message =
            serde_json::from_str(r#"{"role":"user","content":"hello"}"#).unwrap();
        assert_eq!(message, Message::user("hello"));
    }
}

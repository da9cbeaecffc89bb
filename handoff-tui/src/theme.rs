//! Color palettes and status-to-color mapping.

use crate::notifications::NotificationLevel;
use handoff_core::{OperatorStatus, Priority, Role, SessionStatus};
use ratatui::style::Color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub accent_dim: Color,
    pub agent: Color,
    pub human: Color,
    pub system: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub highlight: Color,
}

impl Theme {
    pub fn slate() -> Self {
        Self {
            name: "slate",
            accent: Color::Rgb(99, 102, 241),
            accent_dim: Color::Rgb(67, 56, 202),
            agent: Color::Rgb(148, 163, 184),
            human: Color::Rgb(56, 189, 248),
            system: Color::Rgb(250, 204, 21),
            success: Color::Rgb(34, 197, 94),
            warning: Color::Rgb(234, 179, 8),
            error: Color::Rgb(239, 68, 68),
            info: Color::Rgb(59, 130, 246),
            text: Color::Rgb(226, 232, 240),
            text_dim: Color::Rgb(100, 116, 139),
            border: Color::Rgb(51, 65, 85),
            highlight: Color::Rgb(30, 41, 59),
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast",
            accent: Color::Cyan,
            accent_dim: Color::Blue,
            agent: Color::White,
            human: Color::LightCyan,
            system: Color::Yellow,
            success: Color::LightGreen,
            warning: Color::Yellow,
            error: Color::LightRed,
            info: Color::LightBlue,
            text: Color::White,
            text_dim: Color::Gray,
            border: Color::White,
            highlight: Color::DarkGray,
        }
    }

    /// Palette for a configured name; unknown names fall back to slate.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "high-contrast" => Self::high_contrast(),
            _ => Self::slate(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::slate()
    }
}

pub fn session_status_color(status: SessionStatus, theme: &Theme) -> Color {
    match status {
        SessionStatus::Active => theme.success,
        SessionStatus::Resolved => theme.text_dim,
    }
}

pub fn priority_color(priority: Priority, theme: &Theme) -> Color {
    match priority {
        Priority::High => theme.error,
        Priority::Medium => theme.warning,
        Priority::Low => theme.info,
    }
}

/// Color for a turn; operator replies stand out from agent replies.
pub fn role_color(role: Role, human_support: bool, theme: &Theme) -> Color {
    match role {
        Role::User => theme.accent,
        Role::Assistant if human_support => theme.human,
        Role::Assistant => theme.agent,
        Role::System => theme.system,
    }
}

pub fn operator_status_color(status: Option<OperatorStatus>, theme: &Theme) -> Color {
    match status {
        Some(OperatorStatus::Available) => theme.success,
        Some(OperatorStatus::Busy) => theme.warning,
        Some(OperatorStatus::Away) | None => theme.text_dim,
    }
}

pub fn notification_color(level: NotificationLevel, theme: &Theme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}

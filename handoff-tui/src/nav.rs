//! Portals and the views each one navigates between.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which audience the TUI is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    Admin,
    #[default]
    Agent,
    Chat,
}

impl Portal {
    pub fn title(&self) -> &'static str {
        match self {
            Portal::Admin => "Admin Dashboard",
            Portal::Agent => "Agent Portal",
            Portal::Chat => "Support Chat",
        }
    }

    /// View shown at start-up and when backing out of everything.
    pub fn home_view(&self) -> View {
        match self {
            Portal::Admin | Portal::Agent => View::Dashboard,
            Portal::Chat => View::UserChat,
        }
    }

    pub fn views(&self) -> &'static [View] {
        match self {
            Portal::Admin => &[View::Dashboard, View::Detail],
            Portal::Agent => &[View::Dashboard, View::Detail, View::OperatorChat],
            Portal::Chat => &[View::UserChat],
        }
    }

    pub fn allows(&self, view: View) -> bool {
        self.views().contains(&view)
    }

    /// Whether the Assigned tab applies (only operators have assignments).
    pub fn has_assigned_tab(&self) -> bool {
        matches!(self, Portal::Agent)
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Portal::Admin => "admin",
            Portal::Agent => "agent",
            Portal::Chat => "chat",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Portal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Portal::Admin),
            "agent" | "operator" => Ok(Portal::Agent),
            "chat" | "user" => Ok(Portal::Chat),
            _ => Err(format!("Invalid portal: {} (expected admin, agent or chat)", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Dashboard,
    Detail,
    OperatorChat,
    UserChat,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Tickets",
            View::Detail => "Ticket",
            View::OperatorChat => "Live Chat",
            View::UserChat => "Chat",
        }
    }

    /// Where Esc leads from this view.
    pub fn back(&self) -> Option<View> {
        match self {
            View::Dashboard | View::UserChat => None,
            View::Detail => Some(View::Dashboard),
            View::OperatorChat => Some(View::Detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_parse() {
        assert_eq!("ADMIN".parse::<Portal>(), Ok(Portal::Admin));
        assert_eq!("chat".parse::<Portal>(), Ok(Portal::Chat));
        assert!("kiosk".parse::<Portal>().is_err());
    }

    #[test]
    fn test_back_chain_ends_at_home() {
        for portal in [Portal::Admin, Portal::Agent, Portal::Chat] {
            for view in portal.views() {
                let mut current = *view;
                while let Some(prev) = current.back() {
                    assert!(portal.allows(prev));
                    current = prev;
                }
                assert_eq!(current, portal.home_view());
            }
        }
    }

    #[test]
    fn test_admin_has_no_live_chat() {
        assert!(!Portal::Admin.allows(View::OperatorChat));
        assert!(Portal::Agent.allows(View::OperatorChat));
    }
}

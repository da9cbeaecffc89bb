//! Human operators who can join, assist and resolve tickets.

use crate::enums::OperatorStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Operator {
    /// Parsed presence; unknown or missing values read as `None`.
    pub fn status(&self) -> Option<OperatorStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn is_available(&self) -> bool {
        self.status() == Some(OperatorStatus::Available)
    }
}

/// Body of `GET /operators`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorsResponse {
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub total_count: usize,
}

impl OperatorsResponse {
    pub fn find_by_email(&self, email: &str) -> Option<&Operator> {
        self.operators
            .iter()
            .find(|op| op.email.eq_ignore_ascii_case(email))
    }

    pub fn available_count(&self) -> usize {
        self.operators.iter().filter(|op| op.is_available()).count()
    }
}

/// The operator signed in to the agent portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl OperatorIdentity {
    /// Whether a ticket assignee names this operator.
    pub fn matches(&self, assignee: &str) -> bool {
        let assignee = assignee.trim();
        assignee.eq_ignore_ascii_case(&self.email)
            || self
                .full_name
                .as_deref()
                .is_some_and(|name| assignee.eq_ignore_ascii_case(name))
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_response_parses_without_status() {
        let parsed: OperatorsResponse = serde_json::from_str(
            r#"{"operators":[{"full_name":"Sarah Johnson","email":"sarah@example.com"}],"total_count":1}"#,
        )
        .unwrap();
        assert_eq!(parsed.total_count, 1);
        assert!(parsed.operators[0].status().is_none());
        assert!(parsed.find_by_email("SARAH@example.com").is_some());
    }

    #[test]
    fn test_identity_matches_name_or_email() {
        let me = OperatorIdentity {
            email: "sarah@example.com".to_string(),
            full_name: Some("Sarah Johnson".to_string()),
        };
        assert!(me.matches("Sarah Johnson"));
        assert!(me.matches("sarah@example.com"));
        assert!(!me.matches("Michael Chen"));
    }

    #[test]
    fn test_available_count() {
        let response = OperatorsResponse {
            operators: vec![
                Operator {
                    full_name: "A".into(),
                    email: "a@x".into(),
                    status: Some("available".into()),
                },
                Operator {
                    full_name: "B".into(),
                    email: "b@x".into(),
                    status: Some("Busy".into()),
                },
            ],
            total_count: 2,
        };
        assert_eq!(response.available_count(), 1);
    }
}

//! Handoff Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for entity and frame types
//! - Fixtures mirroring the demo tickets and operators
//! - An in-process mock backend speaking the REST and WebSocket protocol
//! - Async helpers for waiting on events

pub mod mock_backend;

pub use mock_backend::{MockBackend, RecordedCall};

pub use handoff_core::{
    Conversation, DashboardRow, DashboardTab, HistoryEntry, InboundFrame, Message, Operator,
    OperatorIdentity, OperatorsResponse, Priority, Role, SessionDetail, SessionStatus,
    SessionSummary, Ticket, TraceEvent,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for hand-off entity types.

    use super::*;
    use proptest::prelude::*;

    /// 12 lowercase hex chars, the shape of backend-issued ids.
    pub fn arb_session_id() -> impl Strategy<Value = String> {
        "[0-9a-f]{12}"
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![
            Just(Priority::High),
            Just(Priority::Medium),
            Just(Priority::Low),
        ]
    }

    pub fn arb_status() -> impl Strategy<Value = SessionStatus> {
        prop_oneof![Just(SessionStatus::Active), Just(SessionStatus::Resolved)]
    }

    pub fn arb_tab() -> impl Strategy<Value = DashboardTab> {
        prop_oneof![
            Just(DashboardTab::Active),
            Just(DashboardTab::Assigned),
            Just(DashboardTab::Resolved),
        ]
    }

    pub fn arb_assignee() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop_oneof![
            Just("Sarah Johnson".to_string()),
            Just("Michael Chen".to_string()),
            Just("Emily Rodriguez".to_string()),
        ])
    }

    /// RFC 3339 start time within a few weeks of April 2025.
    pub fn arb_started_at() -> impl Strategy<Value = String> {
        (0i64..3_000_000).prop_map(|offset| {
            chrono::DateTime::from_timestamp(1_743_500_000 + offset, 0)
                .unwrap_or_default()
                .to_rfc3339()
        })
    }

    pub fn arb_session_summary() -> impl Strategy<Value = SessionSummary> {
        (
            arb_session_id(),
            arb_started_at(),
            any::<bool>(),
            arb_assignee(),
            arb_priority(),
        )
            .prop_map(|(id, started_at, resolved, assigned_to, priority)| SessionSummary {
                session_id: id,
                started_at: Some(started_at),
                ended_at: None,
                resolved,
                assigned_to,
                user_id: None,
                priority: Some(priority.to_string()),
            })
    }

    /// Backend history role tokens, including ones the client folds.
    pub fn arb_history_role() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop_oneof![
            Just("user".to_string()),
            Just("agent".to_string()),
            Just("assistant".to_string()),
            Just("human".to_string()),
            Just("system".to_string()),
            Just("tool".to_string()),
        ])
    }

    pub fn arb_history_entry() -> impl Strategy<Value = HistoryEntry> {
        (
            arb_history_role(),
            "[A-Za-z0-9 ?!.]{0,40}",
            prop::option::of("[A-Za-z]{3,14}"),
            prop::option::of("[0-9]{1,3}"),
            any::<bool>(),
        )
            .prop_map(|(role, content, agent, turn_id, flagged)| HistoryEntry {
                role,
                content,
                agent,
                timestamp: None,
                flagged: Some(flagged),
                turn_id,
                tool_call: None,
                handoff: None,
            })
    }

    pub fn arb_conversation() -> impl Strategy<Value = Conversation> {
        prop::collection::vec(arb_history_entry(), 0..16).prop_map(|entries| {
            entries
                .into_iter()
                .map(HistoryEntry::into_message)
                .collect()
        })
    }

    pub fn arb_ticket() -> impl Strategy<Value = Ticket> {
        (
            arb_session_id(),
            arb_status(),
            arb_priority(),
            arb_assignee(),
            arb_conversation(),
        )
            .prop_map(|(id, status, priority, assignee, conversation)| Ticket {
                id,
                started: "02/04/2025, 16:20:28".to_string(),
                ended: None,
                status,
                priority,
                assigned_to: assignee.unwrap_or_else(|| handoff_core::UNASSIGNED.to_string()),
                has_joined: false,
                resolved_by: None,
                resolved_at: None,
                conversation,
            })
    }

    /// Any frame the backend may push, including unknown types.
    pub fn arb_inbound_frame() -> impl Strategy<Value = InboundFrame> {
        prop_oneof![
            ("[ -~]{0,40}", prop::option::of("[A-Za-z]{1,14}"))
                .prop_map(|(content, agent)| InboundFrame::Message { content, agent }),
            ("[A-Za-z]{1,14}", "[A-Za-z]{1,14}")
                .prop_map(|(source, target)| InboundFrame::Handoff { source, target }),
            "[ -~]{0,40}".prop_map(|content| InboundFrame::System { content }),
            (
                prop_oneof![Just("user".to_string()), Just("assistant".to_string())],
                "[ -~]{0,40}"
            )
                .prop_map(|(role, content)| InboundFrame::TraceEvent {
                    trace: TraceEvent { role, content },
                }),
            Just(InboundFrame::Unknown),
        ]
    }

    pub fn arb_operator_identity() -> impl Strategy<Value = OperatorIdentity> {
        ("[a-z]{3,10}", prop::option::of("[A-Z][a-z]{2,8} [A-Z][a-z]{2,10}")).prop_map(
            |(user, full_name)| OperatorIdentity {
                email: format!("{}@example.com", user),
                full_name,
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Demo tickets and operators used across the integration suites.

    use super::*;

    /// Active ticket used by the takeover scenario.
    pub const TAKEOVER_TICKET_ID: &str = "80b74a3e1f4b";

    pub const UNASSIGNED_TICKET_ID: &str = "ebfa85eb1c97";

    pub const RESOLVED_TICKET_ID: &str = "c4b09654a413";

    fn entry(role: &str, content: &str, agent: Option<&str>, turn_id: &str) -> HistoryEntry {
        HistoryEntry {
            role: Some(role.to_string()),
            content: content.to_string(),
            agent: agent.map(str::to_string),
            timestamp: Some("2025-04-02T16:33:08+00:00".to_string()),
            flagged: Some(false),
            turn_id: Some(turn_id.to_string()),
            tool_call: None,
            handoff: None,
        }
    }

    fn detail(
        id: &str,
        started_at: &str,
        resolved: bool,
        assigned_to: Option<&str>,
        priority: Priority,
        conversation: Vec<HistoryEntry>,
    ) -> SessionDetail {
        SessionDetail {
            id: Some(id.to_string()),
            started_at: Some(started_at.to_string()),
            ended_at: resolved.then(|| "2025-04-02T16:47:46+00:00".to_string()),
            resolved,
            assigned_to: assigned_to.map(str::to_string),
            resolved_by: None,
            resolved_at: None,
            priority: Some(priority.to_string()),
            conversation,
        }
    }

    pub fn takeover_ticket() -> SessionDetail {
        detail(
            TAKEOVER_TICKET_ID,
            "2025-04-02T16:33:08+00:00",
            false,
            Some("Sarah Johnson"),
            Priority::Medium,
            vec![
                entry("user", "hi", None, "1"),
                entry("agent", "How can I assist you today?", Some("TriageAgent"), "2"),
                entry("user", "My order never arrived", None, "3"),
                entry(
                    "agent",
                    "Let me connect you with someone who can help.",
                    Some("TriageAgent"),
                    "4",
                ),
            ],
        )
    }

    pub fn demo_tickets() -> Vec<SessionDetail> {
        vec![
            takeover_ticket(),
            detail(
                UNASSIGNED_TICKET_ID,
                "2025-04-02T16:19:59+00:00",
                false,
                None,
                Priority::High,
                vec![entry("user", "I was charged twice", None, "1")],
            ),
            detail(
                RESOLVED_TICKET_ID,
                "2025-04-02T16:44:50+00:00",
                true,
                Some("Sarah Johnson"),
                Priority::Medium,
                vec![entry("user", "Thanks, all sorted", None, "1")],
            ),
            detail(
                "8e17e075d8fa",
                "2025-04-03T14:21:39+00:00",
                true,
                Some("Emily Rodriguez"),
                Priority::Low,
                vec![],
            ),
        ]
    }

    pub fn demo_operators() -> OperatorsResponse {
        let operators = vec![
            Operator {
                full_name: "Sarah Johnson".to_string(),
                email: "sarah.johnson@example.com".to_string(),
                status: Some("Available".to_string()),
            },
            Operator {
                full_name: "Michael Chen".to_string(),
                email: "michael.chen@example.com".to_string(),
                status: Some("Busy".to_string()),
            },
            Operator {
                full_name: "Emily Rodriguez".to_string(),
                email: "emily.rodriguez@example.com".to_string(),
                status: Some("Available".to_string()),
            },
        ];
        OperatorsResponse {
            total_count: operators.len(),
            operators,
        }
    }

    pub fn sarah() -> OperatorIdentity {
        OperatorIdentity {
            email: "sarah.johnson@example.com".to_string(),
            full_name: Some("Sarah Johnson".to_string()),
        }
    }
}

// ============================================================================
// ASYNC HELPERS
// ============================================================================

pub mod wait {
    //! Bounded waits for asynchronous effects.

    use std::time::Duration;
    use tokio::sync::mpsc;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Next event on `rx`, or `None` after [`DEFAULT_TIMEOUT`].
    pub async fn next_event<E>(rx: &mut mpsc::Receiver<E>) -> Option<E> {
        tokio::time::timeout(DEFAULT_TIMEOUT, rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Receive until `pick` accepts an event. Skipped events are returned
    /// alongside the accepted one, in arrival order.
    pub async fn event_matching<E, F>(rx: &mut mpsc::Receiver<E>, mut pick: F) -> Option<(E, Vec<E>)>
    where
        F: FnMut(&E) -> bool,
    {
        let mut skipped = Vec::new();
        while let Some(event) = next_event(rx).await {
            if pick(&event) {
                return Some((event, skipped));
            }
            skipped.push(event);
        }
        None
    }

    /// Poll `condition` every 10ms until it holds or the timeout expires.
    pub async fn until<F>(mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }
}

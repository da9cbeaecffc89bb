use handoff_core::dashboard::{rows_from_summaries, tab_count};
use handoff_core::{
    Conversation, DashboardFilter, DashboardTab, InboundFrame, Message, OperatorIdentity,
    Priority, Role, SessionStatus, SessionSummary,
};
use proptest::prelude::*;

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

fn arb_tab() -> impl Strategy<Value = DashboardTab> {
    prop_oneof![
        Just(DashboardTab::Active),
        Just(DashboardTab::Assigned),
        Just(DashboardTab::Resolved),
    ]
}

fn arb_summary() -> impl Strategy<Value = SessionSummary> {
    (
        "[0-9a-f]{12}",
        0i64..1_000_000,
        any::<bool>(),
        prop::option::of(prop_oneof![
            Just("Sarah Johnson".to_string()),
            Just("Michael Chen".to_string()),
        ]),
        arb_priority(),
    )
        .prop_map(|(id, offset, resolved, assigned_to, priority)| {
            let started = chrono::DateTime::from_timestamp(1_743_600_000 + offset, 0)
                .unwrap_or_default()
                .to_rfc3339();
            SessionSummary {
                session_id: id,
                started_at: Some(started),
                ended_at: None,
                resolved,
                assigned_to,
                user_id: None,
                priority: Some(priority.to_string()),
            }
        })
}

fn arb_conversation() -> impl Strategy<Value = Conversation> {
    prop::collection::vec(("[a-z ]{0,20}", prop::option::of("[0-9]{1,2}")), 0..20).prop_map(
        |turns| {
            turns
                .into_iter()
                .map(|(content, turn_id)| {
                    let message = Message::user(content);
                    match turn_id {
                        Some(id) => message.with_turn_id(id),
                        None => message,
                    }
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn prop_toggle_flag_touches_only_matching_turns(
        conversation in arb_conversation(),
        turn_id in "[0-9]{1,2}",
    ) {
        let mut toggled = conversation.clone();
        toggled.toggle_flag(&turn_id);
        for (before, after) in conversation.iter().zip(toggled.iter()) {
            if before.turn_id.as_deref() == Some(turn_id.as_str()) {
                prop_assert_ne!(before.flagged, after.flagged);
            } else {
                prop_assert_eq!(before.flagged, after.flagged);
            }
        }
    }

    #[test]
    fn prop_message_frame_appends_exactly_one(
        conversation in arb_conversation(),
        content in "[ -~]{0,40}",
        agent in "[A-Za-z]{1,16}",
    ) {
        let frame = InboundFrame::Message { content: content.clone(), agent: Some(agent.clone()) };
        let mut grown = conversation.clone();
        if let Some(message) = frame.to_message() {
            grown.push(message);
        }
        prop_assert_eq!(grown.len(), conversation.len() + 1);
        let last = grown.last().unwrap();
        prop_assert_eq!(last.role, Role::Assistant);
        prop_assert_eq!(&last.content, &content);
        prop_assert_eq!(last.agent.as_deref(), Some(agent.as_str()));
    }

    #[test]
    fn prop_filter_is_subset_of_tab(
        summaries in prop::collection::vec(arb_summary(), 0..25),
        tab in arb_tab(),
        priority in prop::option::of(arb_priority()),
    ) {
        let rows = rows_from_summaries(&summaries);
        let filter = DashboardFilter { tab, priority, query: String::new() };
        let matched = filter.apply(&rows, None);
        prop_assert!(matched.len() <= tab_count(tab, &rows, None));
        for row in matched {
            if let Some(p) = priority {
                prop_assert_eq!(row.priority, p);
            }
        }
    }

    #[test]
    fn prop_active_and_resolved_partition_rows(
        summaries in prop::collection::vec(arb_summary(), 0..25),
    ) {
        let rows = rows_from_summaries(&summaries);
        let active = tab_count(DashboardTab::Active, &rows, None);
        let resolved = tab_count(DashboardTab::Resolved, &rows, None);
        prop_assert_eq!(active + resolved, rows.len());
    }

    #[test]
    fn prop_rows_sorted_newest_first(
        summaries in prop::collection::vec(arb_summary(), 0..25),
    ) {
        let rows = rows_from_summaries(&summaries);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].started_at >= pair[1].started_at);
        }
    }

    #[test]
    fn prop_assigned_tab_matches_identity(
        summaries in prop::collection::vec(arb_summary(), 0..25),
    ) {
        let rows = rows_from_summaries(&summaries);
        let me = OperatorIdentity {
            email: "sarah@example.com".to_string(),
            full_name: Some("Sarah Johnson".to_string()),
        };
        let filter = DashboardFilter { tab: DashboardTab::Assigned, ..DashboardFilter::new() };
        for row in filter.apply(&rows, Some(&me)) {
            prop_assert_eq!(row.assigned_to.as_str(), "Sarah Johnson");
        }
    }

    #[test]
    fn prop_status_toggle_alternates(flips in 0usize..10) {
        let mut status = SessionStatus::Active;
        for _ in 0..flips {
            status = status.toggled();
        }
        prop_assert_eq!(status.is_resolved(), flips % 2 == 1);
    }
}

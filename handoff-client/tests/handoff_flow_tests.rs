//! End-to-end flows against the in-process mock backend.

use handoff_client::{
    ApiClientError, ClientConfig, ConnectionState, HandoffClient, OperatorChat, SendOutcome,
    SocketEvent, SocketUpdate, TicketDesk, UserChat,
};
use handoff_core::dashboard::rows_from_summaries;
use handoff_core::{
    HandoffError, InboundFrame, RecordKind, Role, SessionStatus, TraceEvent, HUMAN_SUPPORT_LABEL,
    RESOLVED_NOTICE, TAKEOVER_NOTICE,
};
use handoff_test_utils::fixtures::{
    demo_operators, RESOLVED_TICKET_ID, TAKEOVER_TICKET_ID, UNASSIGNED_TICKET_ID,
};
use handoff_test_utils::{wait, MockBackend};
use std::time::Duration;
use tokio::sync::mpsc;

async fn setup() -> (MockBackend, HandoffClient) {
    let backend = MockBackend::start().await.expect("mock backend");
    let client = HandoffClient::new(&ClientConfig::new(backend.base_url())).expect("client");
    (backend, client)
}

/// Feed updates to `apply` until `done` accepts one's event.
async fn pump_until(
    rx: &mut mpsc::Receiver<SocketUpdate>,
    mut apply: impl FnMut(&SocketUpdate),
    mut done: impl FnMut(&SocketEvent) -> bool,
) -> bool {
    while let Some(update) = wait::next_event(rx).await {
        apply(&update);
        if done(&update.event) {
            return true;
        }
    }
    false
}

fn is_agent_reply(event: &SocketEvent) -> bool {
    matches!(event, SocketEvent::Frame(InboundFrame::Message { .. }))
}

// ============================================================================
// END-USER CHAT
// ============================================================================

#[tokio::test]
async fn test_mount_opens_no_socket_until_first_send() {
    let (backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = UserChat::new(RecordKind::Session);
    let id = chat.initialize(client.rest()).await.unwrap().to_string();
    assert_eq!(id.len(), 12);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.user_connections(), 0);
    assert_eq!(backend.calls_to(&format!("/ws/{}", id)), 0);
    assert_eq!(chat.state(), ConnectionState::Idle);

    let outcome = chat.send("hi", client.ws(), &tx).unwrap();
    assert_eq!(outcome, SendOutcome::Connecting);

    assert!(pump_until(&mut rx, |u| chat.handle(u), is_agent_reply).await);
    assert!(chat.is_connected());
    assert_eq!(backend.user_connections(), 1);
    assert_eq!(backend.received_messages(), vec![(id, "hi".to_string())]);
}

#[tokio::test]
async fn test_blank_send_makes_no_calls() {
    let (backend, client) = setup().await;
    let (tx, _rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = UserChat::new(RecordKind::Session);
    chat.initialize(client.rest()).await.unwrap();
    let calls_before = backend.calls().len();

    for blank in ["", "   ", "\n\t"] {
        assert_eq!(chat.send(blank, client.ws(), &tx), Ok(SendOutcome::Ignored));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.calls().len(), calls_before);
    assert_eq!(backend.user_connections(), 0);
    assert!(chat.conversation().is_empty());
}

#[tokio::test]
async fn test_agent_reply_appends_exactly_one_message() {
    let (_backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = UserChat::new(RecordKind::Session);
    chat.initialize(client.rest()).await.unwrap();
    chat.send("where is my order", client.ws(), &tx).unwrap();
    assert!(pump_until(&mut rx, |u| chat.handle(u), is_agent_reply).await);

    // The hand-off frame that precedes the reply adds nothing.
    assert_eq!(chat.conversation().len(), 2);
    let reply = chat.conversation().last().unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "You said: where is my order");
    assert_eq!(reply.agent.as_deref(), Some("MarketingAgent"));
    assert!(!chat.awaiting_reply());
}

#[tokio::test]
async fn test_messages_sent_while_connecting_share_one_socket() {
    let (backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = UserChat::new(RecordKind::Session);
    let id = chat.initialize(client.rest()).await.unwrap().to_string();

    assert_eq!(chat.send("first", client.ws(), &tx), Ok(SendOutcome::Connecting));
    assert_eq!(chat.send("second", client.ws(), &tx), Ok(SendOutcome::Queued));

    let mut replies = 0;
    assert!(
        pump_until(
            &mut rx,
            |u| chat.handle(u),
            |e| {
                if is_agent_reply(e) {
                    replies += 1;
                }
                replies == 2
            }
        )
        .await
    );

    assert_eq!(backend.user_connections(), 1);
    assert_eq!(
        backend.received_messages(),
        vec![
            (id.clone(), "first".to_string()),
            (id, "second".to_string())
        ]
    );
    assert_eq!(chat.send("third", client.ws(), &tx), Ok(SendOutcome::Sent));
}

#[tokio::test]
async fn test_generate_ticket_id() {
    let (backend, client) = setup().await;
    let mut chat = UserChat::new(RecordKind::Ticket);
    chat.initialize(client.rest()).await.unwrap();
    assert!(chat.session_id().is_some());
    assert_eq!(backend.calls_to("/generate-ticket-id"), 1);
}

#[tokio::test]
async fn test_initialize_failure_leaves_chat_without_id() {
    let client = HandoffClient::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap();
    let mut chat = UserChat::new(RecordKind::Session);
    assert!(chat.initialize(client.rest()).await.is_err());
    assert!(chat.session_id().is_none());
}

// ============================================================================
// TICKET ACTIONS
// ============================================================================

#[tokio::test]
async fn test_toggle_resolve_flips_even_when_backend_fails() {
    let (backend, client) = setup().await;
    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, TAKEOVER_TICKET_ID)
        .await
        .unwrap();
    assert_eq!(desk.ticket().status, SessionStatus::Active);

    backend.fail_actions(true);
    let update = desk.toggle_resolve_status(client.rest()).await;
    assert_eq!(update.value, SessionStatus::Resolved);
    assert!(!update.is_confirmed());
    assert!(desk.ticket().is_resolved());
    assert!(desk.ticket().resolved_by.is_some());

    let update = desk.toggle_resolve_status(client.rest()).await;
    assert_eq!(update.value, SessionStatus::Active);
    assert_eq!(
        backend.calls_to(&format!("/tickets/{}/toggle-resolve", TAKEOVER_TICKET_ID)),
        2
    );
}

#[tokio::test]
async fn test_toggle_resolve_confirmed() {
    let (backend, client) = setup().await;
    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, TAKEOVER_TICKET_ID)
        .await
        .unwrap();
    let update = desk.toggle_resolve_status(client.rest()).await;
    assert!(update.is_confirmed());
    assert!(backend.record(TAKEOVER_TICKET_ID).unwrap().resolved);
}

#[tokio::test]
async fn test_flag_touches_only_matching_turn() {
    let (backend, client) = setup().await;
    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, TAKEOVER_TICKET_ID)
        .await
        .unwrap();

    backend.fail_actions(true);
    let update = desk.toggle_message_flag(client.rest(), "2").await;
    assert!(update.value);
    assert!(update.remote_error.is_some());

    let flags: Vec<bool> = desk.ticket().conversation.iter().map(|m| m.flagged).collect();
    assert_eq!(flags, vec![false, true, false, false]);
    assert_eq!(
        backend.calls_to(&format!("/tickets/{}/flag/2", TAKEOVER_TICKET_ID)),
        1
    );
}

#[tokio::test]
async fn test_transfer_sets_operator_full_name() {
    let (backend, client) = setup().await;
    let operators = client.rest().list_operators().await.unwrap();
    assert_eq!(operators, demo_operators());

    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, UNASSIGNED_TICKET_ID)
        .await
        .unwrap();
    assert!(desk.ticket().is_unassigned());

    let assignee = desk
        .transfer(
            client.rest(),
            Some("sarah.johnson@example.com"),
            Some("michael.chen@example.com"),
            &operators,
        )
        .await
        .unwrap();
    assert_eq!(assignee, "Michael Chen");
    assert_eq!(desk.ticket().assigned_to, "Michael Chen");

    let call = backend
        .calls()
        .into_iter()
        .find(|c| c.path == "/ticket-transfer")
        .unwrap();
    let body = call.body.unwrap();
    assert_eq!(body["ticketId"], UNASSIGNED_TICKET_ID);
    assert_eq!(body["from"], "sarah.johnson@example.com");
}

#[tokio::test]
async fn test_transfer_reports_backend_detail() {
    let (_backend, client) = setup().await;
    let operators = demo_operators();
    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, UNASSIGNED_TICKET_ID)
        .await
        .unwrap();

    let err = desk
        .transfer(client.rest(), Some("a@example.com"), Some("nobody@example.com"), &operators)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        HandoffError::Remote {
            status: 404,
            detail: "Operator not found".to_string()
        }
    );
    assert!(desk.ticket().is_unassigned());
}

#[tokio::test]
async fn test_transfer_requires_target_and_identity() {
    let (backend, client) = setup().await;
    let operators = demo_operators();
    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, UNASSIGNED_TICKET_ID)
        .await
        .unwrap();

    let err = desk
        .transfer(client.rest(), Some("a@example.com"), None, &operators)
        .await
        .unwrap_err();
    assert_eq!(err, HandoffError::NoOperatorSelected);

    let err = desk
        .transfer(client.rest(), None, Some("michael.chen@example.com"), &operators)
        .await
        .unwrap_err();
    assert_eq!(err, HandoffError::MissingIdentity);
    assert_eq!(backend.calls_to("/ticket-transfer"), 0);
}

#[tokio::test]
async fn test_load_missing_ticket_fails() {
    let (_backend, client) = setup().await;
    let err = TicketDesk::load(client.rest(), RecordKind::Ticket, "000000000000")
        .await
        .unwrap_err();
    assert_eq!(err, HandoffError::LoadFailed);
}

#[tokio::test]
async fn test_list_rows_newest_first() {
    let (_backend, client) = setup().await;
    let summaries = client.rest().list(RecordKind::Ticket).await.unwrap();
    let rows = rows_from_summaries(&summaries);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].id, "8e17e075d8fa");
    assert_eq!(rows[0].status, SessionStatus::Resolved);
}

#[tokio::test]
async fn test_authenticate() {
    let (backend, client) = setup().await;
    let response = client
        .rest()
        .authenticate("oauth-code", "http://localhost:3000/callback")
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.email.as_deref(), Some("sarah.johnson@example.com"));

    let err = client
        .rest()
        .authenticate("", "http://localhost:3000/callback")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::InvalidResponse { status: 401, .. }));
    assert_eq!(backend.calls_to("/auth"), 2);
}

// ============================================================================
// OPERATOR TAKEOVER
// ============================================================================

#[tokio::test]
async fn test_join_chat_takes_over_conversation() {
    let (backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut desk = TicketDesk::load(client.rest(), RecordKind::Ticket, TAKEOVER_TICKET_ID)
        .await
        .unwrap();
    assert_eq!(desk.ticket().status, SessionStatus::Active);

    let mut chat = OperatorChat::new(RecordKind::Ticket, TAKEOVER_TICKET_ID);
    chat.load(client.rest()).await.unwrap();
    let history = chat.conversation().len();
    assert_eq!(history, 4);

    chat.join(client.ws(), client.rest(), &tx).unwrap();
    desk.mark_joined();
    assert!(desk.ticket().has_joined);

    assert!(
        pump_until(
            &mut rx,
            |u| chat.handle(u),
            |e| matches!(e, SocketEvent::OverrideEnabled)
        )
        .await
    );

    assert_eq!(backend.calls_to("/override/80b74a3e1f4b"), 1);
    assert_eq!(backend.calls_to("/operator/80b74a3e1f4b"), 1);
    let notice = chat.conversation().last().unwrap();
    assert_eq!(notice.role, Role::System);
    assert_eq!(notice.content, TAKEOVER_NOTICE);
    assert_eq!(chat.conversation().len(), history + 1);
}

#[tokio::test]
async fn test_operator_exchange_and_resolve() {
    let (backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = OperatorChat::new(RecordKind::Ticket, TAKEOVER_TICKET_ID);
    chat.load(client.rest()).await.unwrap();
    chat.join(client.ws(), client.rest(), &tx).unwrap();
    assert!(
        pump_until(
            &mut rx,
            |u| chat.handle(u),
            |e| matches!(e, SocketEvent::Opened { .. })
        )
        .await
    );

    assert_eq!(chat.send("I'm here to help"), Ok(SendOutcome::Sent));
    let sent = chat.conversation().last().unwrap();
    assert_eq!(sent.agent.as_deref(), Some(HUMAN_SUPPORT_LABEL));
    assert!(
        wait::until(|| backend
            .received_messages()
            .contains(&(TAKEOVER_TICKET_ID.to_string(), "I'm here to help".to_string())))
        .await
    );

    assert!(wait::until(|| backend.operator_connections() == 1).await);
    assert!(backend.push_operator_frame(&InboundFrame::TraceEvent {
        trace: TraceEvent {
            role: "user".to_string(),
            content: "still broken".to_string(),
        },
    }));
    assert!(
        pump_until(
            &mut rx,
            |u| chat.handle(u),
            |e| matches!(e, SocketEvent::Frame(InboundFrame::TraceEvent { .. }))
        )
        .await
    );
    let relayed = chat.conversation().last().unwrap();
    assert_eq!(relayed.role, Role::User);
    assert_eq!(relayed.content, "still broken");

    chat.resolve(client.rest()).await.unwrap();
    assert!(chat.is_resolved());
    assert_eq!(chat.conversation().last().unwrap().content, RESOLVED_NOTICE);
    assert!(backend.record(TAKEOVER_TICKET_ID).unwrap().resolved);
    assert!(matches!(
        chat.send("anything else?"),
        Err(HandoffError::Resolved { .. })
    ));
}

#[tokio::test]
async fn test_leaving_a_chat_does_not_disturb_the_next_one() {
    let (backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut left = OperatorChat::new(RecordKind::Ticket, TAKEOVER_TICKET_ID);
    left.load(client.rest()).await.unwrap();
    left.join(client.ws(), client.rest(), &tx).unwrap();
    drop(left);

    let mut next = OperatorChat::new(RecordKind::Ticket, UNASSIGNED_TICKET_ID);
    next.load(client.rest()).await.unwrap();
    let history = next.conversation().len();
    next.join(client.ws(), client.rest(), &tx).unwrap();

    let mut left_closed = false;
    let mut next_overridden = false;
    while !(left_closed && next_overridden) {
        let update = wait::next_event(&mut rx).await.expect("socket update");
        if update.session_id == TAKEOVER_TICKET_ID {
            assert!(!next.owns(update.socket));
            left_closed |= matches!(update.event, SocketEvent::Closed { .. });
        } else {
            next_overridden |= matches!(update.event, SocketEvent::OverrideEnabled);
        }
        next.handle(&update);
    }

    assert_eq!(next.state(), ConnectionState::Connected);
    let notices = next
        .conversation()
        .iter()
        .filter(|m| m.content == TAKEOVER_NOTICE)
        .count();
    assert_eq!(notices, 1);
    assert_eq!(next.conversation().len(), history + 1);
    assert_eq!(backend.calls_to("/override/80b74a3e1f4b"), 0);
    assert_eq!(backend.calls_to("/override/ebfa85eb1c97"), 1);
    assert_eq!(next.send("Hello from support"), Ok(SendOutcome::Sent));
}

#[tokio::test]
async fn test_reload_while_live_keeps_takeover_notice() {
    let (_backend, client) = setup().await;
    let (tx, mut rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = OperatorChat::new(RecordKind::Ticket, TAKEOVER_TICKET_ID);
    chat.load(client.rest()).await.unwrap();
    chat.join(client.ws(), client.rest(), &tx).unwrap();
    assert!(
        pump_until(
            &mut rx,
            |u| chat.handle(u),
            |e| matches!(e, SocketEvent::OverrideEnabled)
        )
        .await
    );
    assert_eq!(chat.send("Looking into it now"), Ok(SendOutcome::Sent));
    let before = chat.conversation().clone();

    chat.load(client.rest()).await.unwrap();
    assert_eq!(chat.conversation(), &before);
    assert_eq!(
        chat.conversation().last().unwrap().agent.as_deref(),
        Some(HUMAN_SUPPORT_LABEL)
    );
}

#[tokio::test]
async fn test_join_refused_for_resolved_session() {
    let (backend, client) = setup().await;
    let (tx, _rx) = mpsc::channel::<SocketUpdate>(32);

    let mut chat = OperatorChat::new(RecordKind::Ticket, RESOLVED_TICKET_ID);
    chat.load(client.rest()).await.unwrap();
    assert!(chat.is_resolved());
    assert!(matches!(
        chat.join(client.ws(), client.rest(), &tx),
        Err(HandoffError::Resolved { .. })
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.operator_connections(), 0);
}

#[tokio::test]
async fn test_failed_resolve_keeps_chat_open() {
    let (backend, client) = setup().await;
    let mut chat = OperatorChat::new(RecordKind::Ticket, TAKEOVER_TICKET_ID);
    chat.load(client.rest()).await.unwrap();

    backend.fail_actions(true);
    assert!(chat.resolve(client.rest()).await.is_err());
    assert!(!chat.is_resolved());
    assert_eq!(
        chat.error(),
        Some("Failed to resolve session. Please try again.")
    );
}

#[tokio::test]
async fn test_operator_load_failure_sets_error() {
    let (_backend, client) = setup().await;
    let mut chat = OperatorChat::new(RecordKind::Ticket, "000000000000");
    assert_eq!(chat.load(client.rest()).await, Err(HandoffError::LoadFailed));
    assert_eq!(chat.error(), Some("Failed to load session data"));
}

//! Property tests for frame handling in the chat state machines.

use handoff_client::{OperatorChat, SocketChannel, SocketEvent, UserChat};
use handoff_core::{InboundFrame, RecordKind, Role};
use handoff_test_utils::generators::{arb_inbound_frame, arb_session_id};
use proptest::prelude::*;

fn opened(id: &str) -> SocketEvent {
    SocketEvent::Opened {
        channel: SocketChannel::User,
        session_id: id.to_string(),
    }
}

proptest! {
    #[test]
    fn prop_user_chat_growth_matches_frame_kinds(
        id in arb_session_id(),
        frames in prop::collection::vec(arb_inbound_frame(), 0..30),
    ) {
        let mut chat = UserChat::with_session_id(RecordKind::Session, id.clone());
        chat.apply(&opened(&id));

        let mut expected = 0;
        for frame in &frames {
            let before = chat.conversation().len();
            chat.apply(&SocketEvent::Frame(frame.clone()));
            let grew = chat.conversation().len() - before;
            match frame {
                InboundFrame::Message { .. } | InboundFrame::System { .. } => {
                    prop_assert_eq!(grew, 1);
                }
                InboundFrame::TraceEvent { trace } => {
                    prop_assert_eq!(grew, usize::from(trace.role == "user"));
                }
                InboundFrame::Handoff { .. } | InboundFrame::Unknown => {
                    prop_assert_eq!(grew, 0);
                }
            }
            expected += grew;
        }
        prop_assert_eq!(chat.conversation().len(), expected);
        prop_assert!(chat.is_connected());
        prop_assert!(!chat.awaiting_reply());
    }

    #[test]
    fn prop_operator_chat_only_appends_user_relays(
        id in arb_session_id(),
        frames in prop::collection::vec(arb_inbound_frame(), 0..30),
    ) {
        let mut chat = OperatorChat::new(RecordKind::Ticket, id);
        for frame in &frames {
            chat.apply(&SocketEvent::Frame(frame.clone()));
        }
        let relayed = frames
            .iter()
            .filter(|f| matches!(f, InboundFrame::TraceEvent { trace } if trace.role == "user"))
            .count();
        prop_assert_eq!(chat.conversation().len(), relayed);
        prop_assert!(chat.conversation().iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn prop_close_after_any_traffic_disconnects(
        id in arb_session_id(),
        frames in prop::collection::vec(arb_inbound_frame(), 0..10),
    ) {
        let mut chat = UserChat::with_session_id(RecordKind::Session, id.clone());
        chat.apply(&opened(&id));
        for frame in frames {
            chat.apply(&SocketEvent::Frame(frame));
        }
        chat.apply(&SocketEvent::Closed { reason: "connection closed".to_string() });
        prop_assert!(!chat.is_connected());
    }
}

//! Property-based tests for the socket session.
//!
//! Invariants verified under arbitrary operation sequences: membership
//! replay equals joins minus leaves, and the outbound queue drains exactly
//! once in enqueue order.

#![allow(clippy::unwrap_used)]

use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use carelink_core::{
    ConnectionConfig, ConnectionState, SessionAction, SocketSession,
    env::{Environment, test_utils::MockEnv},
};
use carelink_proto::{Frame, payloads::GroupPayload};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Join(u8),
    Leave(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![2 => (0u8..8).prop_map(Op::Join), 1 => (0u8..8).prop_map(Op::Leave)]
}

fn group_name(index: u8) -> String {
    format!("consultation_{index}")
}

fn open_generation(actions: &[SessionAction]) -> u64 {
    actions
        .iter()
        .find_map(|action| match action {
            SessionAction::OpenSocket { generation, .. } => Some(*generation),
            _ => None,
        })
        .unwrap()
}

fn join_frames(actions: &[SessionAction]) -> HashSet<String> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::SendFrame(frame) if frame.kind == "join_group" => {
                let payload: GroupPayload = frame.data_as().unwrap();
                Some(payload.group_name)
            },
            _ => None,
        })
        .collect()
}

fn sent_kinds(actions: &[SessionAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::SendFrame(frame) => Some(frame.kind.clone()),
            _ => None,
        })
        .collect()
}

fn connect_and_open(session: &mut SocketSession<Instant>, env: &MockEnv) -> Vec<SessionAction> {
    let actions = session.connect(Some("ws://example/ws/user/?token=t".to_string()));
    let generation = open_generation(&actions);
    session.socket_opened(generation, env.now())
}

/// Clean close, wait out the fixed delay, accept the retry.
fn drop_and_reopen(session: &mut SocketSession<Instant>, env: &MockEnv) -> Vec<SessionAction> {
    let closed = session.socket_closed(session.generation(), env.now());
    assert!(
        closed
            .iter()
            .any(|a| matches!(a, SessionAction::StateChanged(ConnectionState::Reconnecting)))
    );
    env.advance(Duration::from_secs(3));
    let actions = session.tick(env.now());
    let generation = open_generation(&actions);
    session.socket_opened(generation, env.now())
}

proptest! {
    #[test]
    fn replay_equals_joins_minus_leaves(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let env = MockEnv::new();
        let mut session: SocketSession<Instant> = SocketSession::new(ConnectionConfig::default());
        connect_and_open(&mut session, &env);

        let mut model: HashSet<String> = HashSet::new();
        for op in &ops {
            match op {
                Op::Join(index) => {
                    session.join(&group_name(*index));
                    model.insert(group_name(*index));
                },
                Op::Leave(index) => {
                    session.leave(&group_name(*index));
                    model.remove(&group_name(*index));
                },
            }
        }

        let reopened = drop_and_reopen(&mut session, &env);
        prop_assert_eq!(join_frames(&reopened), model);
    }

    #[test]
    fn queue_drains_exactly_once_in_enqueue_order(count in 0usize..30) {
        let env = MockEnv::new();
        let mut session: SocketSession<Instant> = SocketSession::new(ConnectionConfig::default());

        let expected: Vec<String> = (0..count).map(|i| format!("frame_{i}")).collect();
        for kind in &expected {
            session.send(Frame::new(kind.clone()));
        }
        prop_assert_eq!(session.queued(), count);

        let actions = connect_and_open(&mut session, &env);
        prop_assert_eq!(sent_kinds(&actions), expected);
        prop_assert_eq!(session.queued(), 0);

        // A later reconnect cycle delivers nothing a second time.
        let reopened = drop_and_reopen(&mut session, &env);
        prop_assert_eq!(sent_kinds(&reopened), Vec::<String>::new());
    }
}

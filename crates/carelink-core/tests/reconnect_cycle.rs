//! Integration scenarios for the full reconnect cycle.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use carelink_core::{
    ConnectionConfig, ConnectionState, SessionAction, SocketSession,
    env::{Environment, test_utils::MockEnv},
};
use carelink_proto::Frame;

fn open_generation(actions: &[SessionAction]) -> u64 {
    actions
        .iter()
        .find_map(|action| match action {
            SessionAction::OpenSocket { generation, .. } => Some(*generation),
            _ => None,
        })
        .unwrap()
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

#[test]
fn exhausted_attempts_keep_the_queue_for_a_manual_retry() {
    let env = MockEnv::new();
    let config = ConnectionConfig::default();
    let max = config.max_reconnect_attempts;
    let mut session: SocketSession<Instant> = SocketSession::new(config);

    session.send(Frame::ping());

    let actions = session.connect(Some("ws://example".to_string()));
    let mut generation = open_generation(&actions);

    // Every attempt fails until the cap is hit.
    for attempt in 1..=max {
        session.socket_error(generation, env.now());
        if attempt == max {
            break;
        }
        assert_eq!(session.state(), ConnectionState::Reconnecting);
        env.advance(Duration::from_secs(3));
        generation = open_generation(&session.tick(env.now()));
    }

    assert_eq!(session.state(), ConnectionState::Failed);

    // Nothing fires on its own from Failed.
    env.advance(Duration::from_secs(300));
    assert!(session.tick(env.now()).is_empty());

    // The queued frame survived for the caller's manual-retry affordance.
    assert_eq!(session.queued(), 1);
    let actions = session.connect(Some("ws://example".to_string()));
    let generation = open_generation(&actions);
    let actions = session.socket_opened(generation, env.now());
    assert_eq!(sent_kinds(&actions), vec!["ping"]);
}

#[test]
fn membership_and_heartbeat_survive_multiple_drops() {
    let env = MockEnv::new();
    let mut session: SocketSession<Instant> = SocketSession::new(ConnectionConfig::default());

    let actions = session.connect(Some("ws://example".to_string()));
    let generation = open_generation(&actions);
    session.socket_opened(generation, env.now());
    session.join("consultation_8");

    for _ in 0..3 {
        session.socket_closed(session.generation(), env.now());
        env.advance(Duration::from_secs(3));
        let generation = open_generation(&session.tick(env.now()));
        let actions = session.socket_opened(generation, env.now());
        assert_eq!(sent_kinds(&actions), vec!["join_group"]);
    }

    // Heartbeats resume on the fresh link.
    env.advance(Duration::from_millis(30_000));
    let actions = session.tick(env.now());
    assert_eq!(sent_kinds(&actions), vec!["ping"]);
}

#[test]
fn stale_socket_events_after_disconnect_change_nothing() {
    let env = MockEnv::new();
    let mut session: SocketSession<Instant> = SocketSession::new(ConnectionConfig::default());

    let actions = session.connect(Some("ws://example".to_string()));
    let generation = open_generation(&actions);
    session.socket_opened(generation, env.now());

    let actions = session.disconnect();
    assert!(actions.contains(&SessionAction::CloseSocket));
    assert!(actions.contains(&SessionAction::StateChanged(ConnectionState::Disconnected)));

    // Late close/error callbacks from the torn-down socket are ignored.
    assert!(session.socket_closed(generation, env.now()).is_empty());
    assert!(session.socket_error(generation, env.now()).is_empty());
    assert_eq!(session.state(), ConnectionState::Disconnected);

    env.advance(Duration::from_secs(120));
    assert!(session.tick(env.now()).is_empty());
}

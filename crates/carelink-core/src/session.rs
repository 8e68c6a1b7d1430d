//! Socket session: connection, queue, and subscriptions behind one surface.
//!
//! The session is the composition the driver talks to. It owns the
//! [`Connection`] state machine, buffers outbound frames while the link is
//! down, and replays group membership after every reconnect. Like everything
//! in this crate it is sans-IO: every method returns the actions the driver
//! must execute.
//!
//! Ordering guarantees:
//! - outbound frames are never reordered relative to their `send` order;
//! - on every transition into `Connected`, the queue flushes strictly FIFO
//!   *before* group membership is replayed, so frames queued prior to a
//!   reconnect precede anything issued afterwards.

use std::{ops::Sub, time::Duration};

use carelink_proto::Frame;

use crate::{
    connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState},
    queue::OutboundQueue,
    subscriptions::SubscriptionRegistry,
};

/// Actions produced by the session for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Open a socket to `url`; socket callbacks must echo `generation`.
    OpenSocket {
        /// Fully derived socket URL.
        url: String,
        /// Generation guard for this socket's callbacks.
        generation: u64,
    },
    /// Transmit a frame on the open socket.
    SendFrame(Frame),
    /// Close the socket if one is open.
    CloseSocket,
    /// The observable connection state changed.
    StateChanged(ConnectionState),
    /// A parsed inbound frame, ready for routing.
    Deliver(Frame),
}

/// One logical realtime connection with buffering and membership replay.
#[derive(Debug)]
pub struct SocketSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    conn: Connection<I>,
    queue: OutboundQueue,
    subs: SubscriptionRegistry,
}

impl<I> SocketSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a session in `Disconnected` with an empty queue and no groups.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Connection::new(config),
            queue: OutboundQueue::new(),
            subs: SubscriptionRegistry::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// Generation of the current socket attempt.
    ///
    /// Drivers normally remember the generation from the last `OpenSocket`
    /// action; this accessor exists for introspection and tests.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.conn.generation()
    }

    /// Number of frames waiting for the next successful connection.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Groups registered for replay.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subs
    }

    /// Begin connecting.
    ///
    /// `url == None` means the credential lookup came up empty; the session
    /// lands in `Failed` without a socket attempt.
    pub fn connect(&mut self, url: Option<String>) -> Vec<SessionAction> {
        self.track(|session| convert(session.conn.connect(url)))
    }

    /// Socket open callback from the driver.
    ///
    /// On acceptance, flushes the queue FIFO and then replays a join frame
    /// for every registered group.
    pub fn socket_opened(&mut self, generation: u64, now: I) -> Vec<SessionAction> {
        self.track(|session| {
            if !session.conn.socket_opened(generation, now) {
                return vec![];
            }
            let mut actions = Vec::new();
            while let Some(frame) = session.queue.pop() {
                actions.push(SessionAction::SendFrame(frame));
            }
            for group in session.subs.groups() {
                actions.push(SessionAction::SendFrame(Frame::join_group(group)));
            }
            actions
        })
    }

    /// Clean socket close callback from the driver.
    pub fn socket_closed(&mut self, generation: u64, now: I) -> Vec<SessionAction> {
        self.track(|session| {
            session.conn.socket_closed(generation, now);
            vec![]
        })
    }

    /// Transport error callback from the driver.
    pub fn socket_error(&mut self, generation: u64, now: I) -> Vec<SessionAction> {
        self.track(|session| {
            session.conn.socket_error(generation, now);
            vec![]
        })
    }

    /// Raw inbound text from the socket.
    ///
    /// Malformed JSON is dropped silently; a bad frame must never take down
    /// the connection or surface an error.
    pub fn frame_received(&mut self, text: &str) -> Vec<SessionAction> {
        match Frame::decode(text) {
            Ok(frame) => vec![SessionAction::Deliver(frame)],
            Err(_) => vec![],
        }
    }

    /// Periodic maintenance: retries and heartbeats.
    pub fn tick(&mut self, now: I) -> Vec<SessionAction> {
        self.track(|session| convert(session.conn.tick(now)))
    }

    /// Send a frame, queueing it while the link is down.
    ///
    /// Fire-and-forget: never an error. Queued frames drain in FIFO order on
    /// the next successful connection.
    pub fn send(&mut self, frame: Frame) -> Vec<SessionAction> {
        if self.conn.state() == ConnectionState::Connected {
            vec![SessionAction::SendFrame(frame)]
        } else {
            self.queue.push(frame);
            vec![]
        }
    }

    /// Register intent to belong to `group` and, when connected, send a join
    /// frame.
    ///
    /// The join frame is re-sent on every call; only the replay set is
    /// deduplicated.
    pub fn join(&mut self, group: &str) -> Vec<SessionAction> {
        self.subs.join(group);
        if self.conn.state() == ConnectionState::Connected {
            vec![SessionAction::SendFrame(Frame::join_group(group))]
        } else {
            vec![]
        }
    }

    /// Drop intent to belong to `group` and, when connected, send a leave
    /// frame.
    pub fn leave(&mut self, group: &str) -> Vec<SessionAction> {
        self.subs.leave(group);
        if self.conn.state() == ConnectionState::Connected {
            vec![SessionAction::SendFrame(Frame::leave_group(group))]
        } else {
            vec![]
        }
    }

    /// Explicit teardown: closes the socket and disables auto-reconnect.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        self.track(|session| convert(session.conn.disconnect()))
    }

    /// Run `f` and prepend a `StateChanged` action when the observable state
    /// moved.
    fn track<F>(&mut self, f: F) -> Vec<SessionAction>
    where
        F: FnOnce(&mut Self) -> Vec<SessionAction>,
    {
        let before = self.conn.state();
        let mut actions = f(self);
        let after = self.conn.state();
        if before != after {
            actions.insert(0, SessionAction::StateChanged(after));
        }
        actions
    }
}

fn convert(actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
    actions
        .into_iter()
        .map(|action| match action {
            ConnectionAction::OpenSocket { url, generation } => {
                SessionAction::OpenSocket { url, generation }
            },
            ConnectionAction::SendFrame(frame) => SessionAction::SendFrame(frame),
            ConnectionAction::CloseSocket => SessionAction::CloseSocket,
        })
        .collect()
}

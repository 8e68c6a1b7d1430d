//! Connection lifecycle state machine.
//!
//! Owns the logical socket lifecycle: connect, heartbeat, bounded
//! reconnection, and explicit teardown. Uses the action pattern: methods take
//! the current time as input and return actions for the driver to execute,
//! which keeps the state machine pure (no I/O) and directly testable.
//!
//! # State machine
//!
//! ```text
//!               connect(url)              socket_opened
//! Disconnected ─────────────> Connecting ──────────────> Connected
//!   ^   │ connect(None)          │                           │
//!   │   └───────> Failed         │ error                     │ clean close
//!   │                ^           v   (attempts left)         v
//!   │                └───── Reconnecting <─────────── Disconnected
//!   │   attempts exhausted       │ delay elapsed
//!   │                            └──────> Connecting
//!   └── disconnect() from any state
//! ```
//!
//! At most one heartbeat baseline and one reconnect deadline exist at a time
//! (single `Option` fields; re-arming replaces the previous one), so no two
//! timers of the same kind can ever run concurrently.

use std::{ops::Sub, time::Duration};

use carelink_proto::Frame;

/// Default cap on consecutive failed connection attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default fixed delay between reconnection attempts (not exponential).
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Default interval between keepalive pings while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Connection state. Exactly one is current at any time; this machine is the
/// only writer, everything else observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no pending attempt.
    Disconnected,
    /// A socket open is in flight.
    Connecting,
    /// The socket is established.
    Connected,
    /// Waiting out the fixed delay before the next attempt.
    Reconnecting,
    /// Attempts exhausted, or no credential was available. Terminal until an
    /// explicit new `connect`.
    Failed,
}

/// Connection policy knobs.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Consecutive failed attempts tolerated before giving up.
    pub max_reconnect_attempts: u32,
    /// Fixed delay between attempts.
    pub reconnect_delay: Duration,
    /// Keepalive ping interval while connected.
    pub heartbeat_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Actions returned by the connection state machine for the driver to
/// execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Open a socket to `url`. Socket callbacks must echo `generation` back
    /// so that events from a superseded socket are ignored.
    OpenSocket {
        /// Fully derived socket URL (credential included).
        url: String,
        /// Generation guard for this socket's callbacks.
        generation: u64,
    },
    /// Transmit this frame on the open socket.
    SendFrame(Frame),
    /// Close the socket if one is open.
    CloseSocket,
}

/// Connection lifecycle state machine.
///
/// Pure: no I/O, no clock. Time arrives as parameters, generic over the
/// instant type to support both real time and virtual time in tests.
#[derive(Debug, Clone)]
pub struct Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ConnectionState,
    config: ConnectionConfig,
    /// Socket URL from the last `connect`, reused for retry attempts.
    url: Option<String>,
    /// Consecutive failed attempts since the last successful open.
    failures: u32,
    /// Monotonic guard; bumped on every socket open and on teardown so stale
    /// callbacks cannot resurrect state.
    generation: u64,
    /// Whether dropped links should be retried. Cleared by `disconnect`.
    auto_reconnect: bool,
    last_heartbeat: Option<I>,
    reconnect_since: Option<I>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new connection in [`ConnectionState::Disconnected`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            config,
            url: None,
            failures: 0,
            generation: 0,
            auto_reconnect: false,
            last_heartbeat: None,
            reconnect_since: None,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Generation of the current socket attempt.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Consecutive failed attempts since the last successful open.
    #[must_use]
    pub fn failed_attempts(&self) -> u32 {
        self.failures
    }

    /// Begin connecting.
    ///
    /// `url == None` means the credential lookup came up empty: the machine
    /// lands in [`ConnectionState::Failed`] without a socket attempt and
    /// without a retry loop (nothing can recover until new credentials
    /// arrive). A connect while an attempt is already owned by the machine is
    /// a no-op.
    pub fn connect(&mut self, url: Option<String>) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Reconnecting => vec![],
            ConnectionState::Disconnected | ConnectionState::Failed => {
                let Some(url) = url else {
                    self.state = ConnectionState::Failed;
                    return vec![];
                };
                self.url = Some(url.clone());
                self.failures = 0;
                self.auto_reconnect = true;
                self.reconnect_since = None;
                self.state = ConnectionState::Connecting;
                self.generation += 1;
                vec![ConnectionAction::OpenSocket { url, generation: self.generation }]
            },
        }
    }

    /// Socket open callback. Returns whether the event was accepted.
    pub fn socket_opened(&mut self, generation: u64, now: I) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.failures = 0;
        self.last_heartbeat = Some(now);
        true
    }

    /// Clean socket close callback. Returns whether the event was accepted.
    ///
    /// A close while still `Connecting` counts as a failed attempt; a close
    /// of an established link schedules a retry without consuming an attempt.
    pub fn socket_closed(&mut self, generation: u64, now: I) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.state {
            ConnectionState::Connected => {
                self.last_heartbeat = None;
                self.state = ConnectionState::Disconnected;
                if self.auto_reconnect {
                    self.schedule_retry(now);
                }
                true
            },
            ConnectionState::Connecting => {
                self.count_failure(now);
                true
            },
            _ => false,
        }
    }

    /// Transport error callback. Returns whether the event was accepted.
    pub fn socket_error(&mut self, generation: u64, now: I) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                self.last_heartbeat = None;
                self.count_failure(now);
                true
            },
            _ => false,
        }
    }

    /// Periodic maintenance: fire due retries and heartbeats.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        if self.state == ConnectionState::Reconnecting
            && let Some(since) = self.reconnect_since
            && now - since >= self.config.reconnect_delay
        {
            self.reconnect_since = None;
            if let Some(url) = self.url.clone() {
                self.state = ConnectionState::Connecting;
                self.generation += 1;
                actions.push(ConnectionAction::OpenSocket { url, generation: self.generation });
            } else {
                // Cannot retry without a URL; treat like exhausted attempts.
                self.state = ConnectionState::Failed;
            }
        }

        if self.state == ConnectionState::Connected
            && let Some(last) = self.last_heartbeat
            && now - last >= self.config.heartbeat_interval
        {
            self.last_heartbeat = Some(now);
            actions.push(ConnectionAction::SendFrame(Frame::ping()));
        }

        actions
    }

    /// Explicit teardown.
    ///
    /// Cancels both deadlines, invalidates in-flight socket callbacks, and
    /// disables auto-reconnection until the next `connect`.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        self.auto_reconnect = false;
        self.reconnect_since = None;
        self.last_heartbeat = None;
        self.generation += 1;
        let had_socket =
            matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected);
        self.state = ConnectionState::Disconnected;
        if had_socket { vec![ConnectionAction::CloseSocket] } else { vec![] }
    }

    fn count_failure(&mut self, now: I) {
        self.failures += 1;
        if self.failures >= self.config.max_reconnect_attempts {
            self.state = ConnectionState::Failed;
            self.reconnect_since = None;
        } else if self.auto_reconnect {
            self.state = ConnectionState::Reconnecting;
            self.reconnect_since = Some(now);
        } else {
            self.state = ConnectionState::Disconnected;
        }
    }

    fn schedule_retry(&mut self, now: I) {
        if self.failures >= self.config.max_reconnect_attempts {
            self.state = ConnectionState::Failed;
            self.reconnect_since = None;
        } else {
            self.state = ConnectionState::Reconnecting;
            self.reconnect_since = Some(now);
        }
    }
}

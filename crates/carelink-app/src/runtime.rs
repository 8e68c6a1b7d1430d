//! Realtime event loop.
//!
//! Drives one [`SocketSession`] over a [`SocketTransport`], executing the
//! actions the session returns and dispatching delivered frames through the
//! [`EventRouter`]. The loop multiplexes three sources on one task: handle
//! commands, socket events, and the periodic maintenance tick, so all
//! session state is touched from a single logical thread.

use std::{sync::Arc, time::Duration};

use carelink_client::TokenProvider;
use carelink_core::{
    Channel, ConnectionConfig, ConnectionState, EventRouter, RealtimeEndpoint, SessionAction,
    SocketSession, env::Environment,
};
use carelink_proto::Frame;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::transport::{SocketTransport, TransportEvent};

/// Cadence of the session maintenance tick.
///
/// Bounds the jitter on the reconnect delay and heartbeat interval.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Send(Frame),
    Join(String),
    Leave(String),
    Shutdown,
}

/// One multiplexed wake-up of the run loop.
enum LoopEvent {
    Command(Option<Command>),
    Socket(Option<TransportEvent>),
    Tick,
}

/// Cloneable handle to a running [`Realtime`] loop.
///
/// All methods are fire-and-forget; feedback arrives through the state
/// watch and the router listeners.
#[derive(Debug, Clone)]
pub struct RealtimeHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl RealtimeHandle {
    /// Begin connecting. The credential lookup happens inside the loop; a
    /// missing token lands the session in `Failed` without a socket attempt.
    pub fn connect(&self) {
        let _ = self.commands.send(Command::Connect);
    }

    /// Tear the connection down and disable auto-reconnect until the next
    /// [`RealtimeHandle::connect`].
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Send a frame; queued while the link is down.
    pub fn send(&self, frame: Frame) {
        let _ = self.commands.send(Command::Send(frame));
    }

    /// Join a group; membership is replayed after every reconnect.
    pub fn join(&self, group: impl Into<String>) {
        let _ = self.commands.send(Command::Join(group.into()));
    }

    /// Leave a group.
    pub fn leave(&self, group: impl Into<String>) {
        let _ = self.commands.send(Command::Leave(group.into()));
    }

    /// Stop the loop. The socket is torn down on the way out.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Observable connection state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

/// The realtime event loop.
///
/// Owns the socket session, router, transport, and environment. The session
/// is the only writer of the connection state; the loop publishes every
/// change on the watch channel.
pub struct Realtime<T, E>
where
    T: SocketTransport,
    E: Environment,
{
    session: SocketSession<E::Instant>,
    router: EventRouter,
    transport: T,
    env: E,
    endpoint: RealtimeEndpoint,
    channel: Channel,
    tokens: Arc<dyn TokenProvider>,
    commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    /// Generation from the most recent `OpenSocket`, echoed into socket
    /// callbacks so stale events are ignored.
    socket_generation: u64,
}

impl<T, E> Realtime<T, E>
where
    T: SocketTransport,
    E: Environment,
{
    /// Create the loop and its handle.
    ///
    /// Register listeners on `router` before constructing the loop; frames
    /// arriving before registration are dropped by design.
    pub fn new(
        transport: T,
        env: E,
        endpoint: RealtimeEndpoint,
        channel: Channel,
        tokens: Arc<dyn TokenProvider>,
        config: ConnectionConfig,
        router: EventRouter,
    ) -> (Self, RealtimeHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let runtime = Self {
            session: SocketSession::new(config),
            router,
            transport,
            env,
            endpoint,
            channel,
            tokens,
            commands: command_rx,
            state_tx,
            socket_generation: 0,
        };
        (runtime, RealtimeHandle { commands: command_tx, state: state_rx })
    }

    /// Drive the loop until `shutdown` or until every handle is dropped.
    ///
    /// The socket is torn down on every exit path.
    pub async fn run(mut self) {
        loop {
            let socket_open = self.transport.is_open();
            let event = tokio::select! {
                maybe_command = self.commands.recv() => LoopEvent::Command(maybe_command),
                event = self.transport.recv(), if socket_open => LoopEvent::Socket(event),
                () = self.env.sleep(TICK_INTERVAL) => LoopEvent::Tick,
            };
            match event {
                LoopEvent::Command(None | Some(Command::Shutdown)) => break,
                LoopEvent::Command(Some(command)) => self.handle_command(command).await,
                LoopEvent::Socket(socket_event) => {
                    self.handle_transport_event(socket_event).await;
                },
                LoopEvent::Tick => {
                    let now = self.env.now();
                    let actions = self.session.tick(now);
                    self.execute(actions).await;
                },
            }
        }

        let actions = self.session.disconnect();
        self.execute(actions).await;
    }

    async fn handle_command(&mut self, command: Command) {
        let actions = match command {
            Command::Connect => {
                let url = match self.tokens.access_token().await {
                    Some(token) => Some(self.endpoint.channel_url(&self.channel, &token)),
                    None => None,
                };
                self.session.connect(url)
            },
            Command::Disconnect => self.session.disconnect(),
            Command::Send(frame) => self.session.send(frame),
            Command::Join(group) => self.session.join(&group),
            Command::Leave(group) => self.session.leave(&group),
            // Handled by the run loop before it gets here.
            Command::Shutdown => vec![],
        };
        self.execute(actions).await;
    }

    async fn handle_transport_event(&mut self, event: Option<TransportEvent>) {
        let now = self.env.now();
        let generation = self.socket_generation;
        let actions = match event {
            Some(TransportEvent::Text(text)) => self.session.frame_received(&text),
            Some(TransportEvent::Closed) | None => self.session.socket_closed(generation, now),
            Some(TransportEvent::Error(reason)) => {
                warn!(%reason, "socket error");
                self.session.socket_error(generation, now)
            },
        };
        self.execute(actions).await;
    }

    /// Execute session actions, feeding any follow-up actions back in until
    /// the cascade settles (an open can trigger a flush, a failed send can
    /// trigger a reconnect).
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut pending = actions;
        while !pending.is_empty() {
            let batch = std::mem::take(&mut pending);
            for action in batch {
                match action {
                    SessionAction::OpenSocket { url, generation } => {
                        self.socket_generation = generation;
                        let now = self.env.now();
                        match self.transport.open(&url).await {
                            Ok(()) => {
                                pending.extend(self.session.socket_opened(generation, now));
                            },
                            Err(error) => {
                                warn!(%error, "socket open failed");
                                pending.extend(self.session.socket_error(generation, now));
                            },
                        }
                    },
                    SessionAction::SendFrame(frame) => match frame.encode() {
                        Ok(text) => {
                            if let Err(error) = self.transport.send(text).await {
                                warn!(%error, "send failed; frame re-queued");
                                let now = self.env.now();
                                pending.extend(
                                    self.session.socket_error(self.socket_generation, now),
                                );
                                // The session is no longer connected, so this
                                // frame (and everything still in this batch)
                                // lands back in the queue in order.
                                pending.extend(self.session.send(frame));
                            }
                        },
                        Err(error) => warn!(%error, "frame encode failed; dropped"),
                    },
                    SessionAction::CloseSocket => self.transport.close().await,
                    SessionAction::StateChanged(state) => {
                        debug!(?state, "connection state changed");
                        let _ = self.state_tx.send(state);
                    },
                    SessionAction::Deliver(frame) => {
                        let outcome = self.router.dispatch(&frame);
                        for (listener, error) in outcome.failures {
                            warn!(?listener, %error, kind = %frame.kind, "listener failed");
                        }
                    },
                }
            }
        }
    }
}

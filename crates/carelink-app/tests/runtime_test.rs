//! Runtime loop tests against a scripted transport on a paused clock.

#![allow(clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use carelink_app::{Realtime, SocketTransport, TokioEnv, TransportError, TransportEvent};
use carelink_client::TokenProvider;
use carelink_core::{Channel, ConnectionConfig, ConnectionState, EventRouter, RealtimeEndpoint};
use carelink_proto::Frame;
use tokio::sync::mpsc;

struct StaticTokens(Option<String>);

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Default)]
struct TransportLog {
    sent: Arc<Mutex<Vec<String>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl TransportLog {
    fn sent_kinds(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| Frame::decode(text).unwrap().kind)
            .collect()
    }

    fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

/// Scripted socket: open results are consumed in order (missing entries
/// succeed), inbound traffic is injected through a channel.
struct FakeTransport {
    open_results: VecDeque<Result<(), TransportError>>,
    incoming: mpsc::UnboundedReceiver<TransportEvent>,
    log: TransportLog,
    open: bool,
}

impl FakeTransport {
    fn new(
        open_results: Vec<Result<(), TransportError>>,
    ) -> (Self, mpsc::UnboundedSender<TransportEvent>, TransportLog) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let log = TransportLog::default();
        let transport = Self {
            open_results: open_results.into_iter().collect(),
            incoming: event_rx,
            log: log.clone(),
            open: false,
        };
        (transport, event_tx, log)
    }
}

#[async_trait]
impl SocketTransport for FakeTransport {
    async fn open(&mut self, url: &str) -> Result<(), TransportError> {
        self.log.opened.lock().unwrap().push(url.to_string());
        match self.open_results.pop_front().unwrap_or(Ok(())) {
            Ok(()) => {
                self.open = true;
                Ok(())
            },
            Err(error) => Err(error),
        }
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.log.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        if !self.open {
            return None;
        }
        match self.incoming.recv().await {
            Some(event) => {
                if matches!(event, TransportEvent::Closed | TransportEvent::Error(_)) {
                    self.open = false;
                }
                Some(event)
            },
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

fn spawn_runtime(
    transport: FakeTransport,
    tokens: Option<String>,
    router: EventRouter,
) -> (carelink_app::RealtimeHandle, tokio::task::JoinHandle<()>) {
    let endpoint = RealtimeEndpoint::new("https://api.clinic.test").unwrap();
    let (runtime, handle) = Realtime::new(
        transport,
        TokioEnv::new(),
        endpoint,
        Channel::User,
        Arc::new(StaticTokens(tokens)),
        ConnectionConfig::default(),
        router,
    );
    let task = tokio::spawn(runtime.run());
    (handle, task)
}

#[tokio::test(start_paused = true)]
async fn queued_frames_flush_before_later_sends() {
    let (transport, _events, log) = FakeTransport::new(vec![]);
    let (handle, task) = spawn_runtime(transport, Some("tok".to_string()), EventRouter::new());

    // Queued while disconnected, transmitted first after the connect.
    handle.send(Frame::ping());
    handle.connect();
    handle.send(Frame::get_status());

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(log.sent_kinds(), vec!["ping", "get_status"]);
    assert_eq!(*handle.state().borrow(), ConnectionState::Connected);
    assert_eq!(
        log.opened.lock().unwrap().as_slice(),
        &["wss://api.clinic.test/ws/user/?token=tok".to_string()]
    );

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_credential_fails_without_a_socket_attempt() {
    let (transport, _events, log) = FakeTransport::new(vec![]);
    let (handle, task) = spawn_runtime(transport, None, EventRouter::new());

    handle.connect();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(*handle.state().borrow(), ConnectionState::Failed);
    assert_eq!(log.open_count(), 0);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn five_failed_attempts_land_in_failed() {
    let failures = (0..5)
        .map(|n| Err(TransportError::Connect(format!("refused #{n}"))))
        .collect::<Vec<_>>();
    let (transport, _events, log) = FakeTransport::new(failures);
    let (handle, task) = spawn_runtime(transport, Some("tok".to_string()), EventRouter::new());

    handle.connect();
    // Four fixed 3 s delays separate the five attempts.
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(log.open_count(), 5);
    assert_eq!(*handle.state().borrow(), ConnectionState::Failed);

    // Terminal: nothing further fires on its own.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(log.open_count(), 5);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn membership_replays_on_the_next_link() {
    let (transport, events, log) = FakeTransport::new(vec![]);
    let (handle, task) = spawn_runtime(transport, Some("tok".to_string()), EventRouter::new());

    handle.connect();
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.join("consultation_2");
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The server drops the link; the runtime reconnects after the delay.
    events.send(TransportEvent::Closed).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(log.open_count(), 2);
    assert_eq!(*handle.state().borrow(), ConnectionState::Connected);
    // One join when issued, one replayed on the fresh socket.
    assert_eq!(log.sent_kinds(), vec!["join_group", "join_group"]);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn heartbeat_pings_while_connected() {
    let (transport, _events, log) = FakeTransport::new(vec![]);
    let (handle, task) = spawn_runtime(transport, Some("tok".to_string()), EventRouter::new());

    handle.connect();
    tokio::time::sleep(Duration::from_secs(61)).await;

    let kinds = log.sent_kinds();
    assert_eq!(kinds.iter().filter(|kind| kind.as_str() == "ping").count(), 2);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn inbound_frames_reach_router_listeners() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let mut router = EventRouter::new();
    let sink = Arc::clone(&received);
    router.on("pong", move |frame| {
        sink.lock().unwrap().push(frame.kind.clone());
        Ok(())
    });

    let (transport, events, _log) = FakeTransport::new(vec![]);
    let (handle, task) = spawn_runtime(transport, Some("tok".to_string()), router);

    handle.connect();
    tokio::time::sleep(Duration::from_secs(1)).await;

    events.send(TransportEvent::Text(r#"{"type":"pong"}"#.to_string())).unwrap();
    // Malformed traffic is dropped without killing the link.
    events.send(TransportEvent::Text("{not json".to_string())).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(received.lock().unwrap().as_slice(), &["pong".to_string()]);
    assert_eq!(*handle.state().borrow(), ConnectionState::Connected);

    handle.shutdown();
    task.await.unwrap();
}

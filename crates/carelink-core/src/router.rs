//! Inbound frame fan-out.

use std::collections::HashMap;

use carelink_proto::Frame;

use crate::error::ListenerError;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Outcome of delivering one frame.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Listeners that ran to completion.
    pub delivered: usize,
    /// Listener failures, isolated so later listeners still ran.
    pub failures: Vec<(ListenerId, ListenerError)>,
}

type Listener = Box<dyn FnMut(&Frame) -> Result<(), ListenerError> + Send>;

/// Dispatches parsed frames to listeners registered per frame type.
///
/// Delivery is synchronous, single-threaded, and in registration order. A
/// failing listener never blocks the rest: its error is collected in the
/// [`DispatchOutcome`] and delivery continues. Frames arriving before any
/// listener registers for their type are dropped; nothing is buffered.
#[derive(Default)]
pub struct EventRouter {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> =
            self.listeners.iter().map(|(kind, list)| (kind.as_str(), list.len())).collect();
        f.debug_struct("EventRouter").field("listeners", &counts).finish()
    }
}

impl EventRouter {
    /// Create a router with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for frames of type `kind`.
    ///
    /// Listeners for the same type are invoked in registration order.
    pub fn on<F>(&mut self, kind: impl Into<String>, listener: F) -> ListenerId
    where
        F: FnMut(&Frame) -> Result<(), ListenerError> + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.entry(kind.into()).or_default().push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether one was removed.
    pub fn off(&mut self, kind: &str, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        list.len() != before
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    /// Deliver `frame` to every listener registered for its type.
    pub fn dispatch(&mut self, frame: &Frame) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some(list) = self.listeners.get_mut(&frame.kind) else {
            return outcome;
        };
        for (id, listener) in list.iter_mut() {
            match listener(frame) {
                Ok(()) => outcome.delivered += 1,
                Err(error) => outcome.failures.push((*id, error)),
            }
        }
        outcome
    }
}

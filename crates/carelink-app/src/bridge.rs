//! Router wiring: inbound frames to conversation and call state.
//!
//! Listeners registered here are the only consumers of push traffic. Each
//! one decodes its payload, projects it onto the owning state machine, and
//! reports UI-facing side effects on the effect channel. Payloads that do
//! not decode are skipped: a malformed push must never disturb the link or
//! the state it failed to reach.

use std::sync::{Arc, Mutex};

use carelink_client::{CallAction, ChatMessage, IncomingCalls, ParticipantRoster, Timeline};
use carelink_core::{EventRouter, ListenerError, env::Environment};
use carelink_proto::{
    kinds,
    payloads::{
        AppointmentUpdatedPayload, IncomingCallPayload, MessageEventPayload, MessageState,
        ParticipantPayload, ParticipantsPayload,
    },
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

/// UI-facing side effects emitted by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Begin playing the ringtone.
    StartRingtone,
    /// Stop playing the ringtone.
    StopRingtone,
    /// Navigate into an accepted call.
    NavigateToCall {
        /// Consultation to open.
        consultation_id: i64,
        /// Appointment the call belongs to.
        appointment_id: i64,
    },
    /// The open conversation's timeline changed; re-render the list.
    TimelineChanged,
    /// The participant roster changed; re-render the header.
    RosterChanged,
    /// An appointment changed; refresh any dependent view.
    AppointmentUpdated {
        /// Appointment that changed.
        appointment_id: i64,
    },
}

/// Subset of the push `message` body needed to project a deletion.
#[derive(Debug, Deserialize)]
struct DeletedMessage {
    id: i64,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

fn locked<'a, S>(
    shared: &'a Arc<Mutex<S>>,
) -> Result<std::sync::MutexGuard<'a, S>, ListenerError> {
    shared.lock().map_err(|_| ListenerError::from("state lock poisoned"))
}

fn notify(effects: &mpsc::UnboundedSender<UiEffect>, effect: UiEffect) {
    let _ = effects.send(effect);
}

/// Attach the conversation listeners for one open conversation.
///
/// `message` frames project create/update/delete onto the timeline;
/// `consultation_message` is the plain new-message push. Live pushes
/// authored by `self_user` are skipped: the optimistic send path reconciles
/// those in place, and appending the echo would duplicate them.
pub fn attach_conversation(
    router: &mut EventRouter,
    timeline: Arc<Mutex<Timeline>>,
    roster: Arc<Mutex<ParticipantRoster>>,
    self_user: i64,
    effects: mpsc::UnboundedSender<UiEffect>,
) {
    let shared = Arc::clone(&timeline);
    let sink = effects.clone();
    router.on(kinds::MESSAGE, move |frame| {
        let Ok(event) = frame.data_as::<MessageEventPayload>() else {
            debug!("undecodable message event; skipped");
            return Ok(());
        };
        let mut timeline = locked(&shared)?;
        let changed = match event.state {
            MessageState::Create => match serde_json::from_value::<ChatMessage>(event.message) {
                Ok(message) if message.author == self_user => false,
                Ok(message) => timeline.push_live(message),
                Err(_) => false,
            },
            MessageState::Update => match serde_json::from_value::<ChatMessage>(event.message) {
                Ok(message) => {
                    let edited_at = message.updated_at.unwrap_or(message.created_at);
                    timeline.apply_edit(message.id, message.content, edited_at)
                },
                Err(_) => false,
            },
            MessageState::Delete => match serde_json::from_value::<DeletedMessage>(event.message) {
                Ok(deleted) => {
                    let deleted_at = deleted.deleted_at.unwrap_or_else(Utc::now);
                    timeline.apply_delete(deleted.id, deleted_at)
                },
                Err(_) => false,
            },
        };
        drop(timeline);
        if changed {
            notify(&sink, UiEffect::TimelineChanged);
        }
        Ok(())
    });

    let shared = Arc::clone(&timeline);
    let sink = effects.clone();
    router.on(kinds::CONSULTATION_MESSAGE, move |frame| {
        let Ok(message) = frame.data_as::<ChatMessage>() else {
            debug!("undecodable consultation message; skipped");
            return Ok(());
        };
        if message.author == self_user {
            return Ok(());
        }
        let appended = locked(&shared)?.push_live(message);
        if appended {
            notify(&sink, UiEffect::TimelineChanged);
        }
        Ok(())
    });

    let shared = Arc::clone(&roster);
    let sink = effects.clone();
    router.on(kinds::PARTICIPANTS, move |frame| {
        let Ok(snapshot) = frame.data_as::<ParticipantsPayload>() else {
            return Ok(());
        };
        locked(&shared)?.replace(snapshot.participants);
        notify(&sink, UiEffect::RosterChanged);
        Ok(())
    });

    let shared = Arc::clone(&roster);
    let sink = effects.clone();
    router.on(kinds::PARTICIPANT_JOINED, move |frame| {
        let Ok(delta) = frame.data_as::<ParticipantPayload>() else {
            return Ok(());
        };
        if locked(&shared)?.joined(delta.user_id) {
            notify(&sink, UiEffect::RosterChanged);
        }
        Ok(())
    });

    let shared = Arc::clone(&roster);
    let sink = effects.clone();
    router.on(kinds::PARTICIPANT_LEFT, move |frame| {
        let Ok(delta) = frame.data_as::<ParticipantPayload>() else {
            return Ok(());
        };
        if locked(&shared)?.left(delta.user_id) {
            notify(&sink, UiEffect::RosterChanged);
        }
        Ok(())
    });

    let sink = effects;
    router.on(kinds::APPOINTMENT_UPDATED, move |frame| {
        let Ok(update) = frame.data_as::<AppointmentUpdatedPayload>() else {
            return Ok(());
        };
        notify(&sink, UiEffect::AppointmentUpdated { appointment_id: update.appointment_id });
        Ok(())
    });
}

/// Attach the incoming-call listener on the presence channel.
///
/// `notification` frames whose payload decodes as a call invitation reach
/// the gate; every other notification shape is ignored here.
pub fn attach_call_gate<E: Environment>(
    router: &mut EventRouter,
    gate: Arc<Mutex<IncomingCalls<E::Instant>>>,
    env: E,
    effects: mpsc::UnboundedSender<UiEffect>,
) {
    router.on(kinds::NOTIFICATION, move |frame| {
        let Ok(invite) = frame.data_as::<IncomingCallPayload>() else {
            return Ok(());
        };
        let now = env.now();
        let actions = locked(&gate)?.offer(invite, now);
        forward_call_actions(&effects, actions);
        Ok(())
    });
}

/// Translate call-gate actions into UI effects.
///
/// Shared by the notification listener and by callers driving the gate
/// directly (accept, dismiss, ring-timeout ticks).
pub fn forward_call_actions(effects: &mpsc::UnboundedSender<UiEffect>, actions: Vec<CallAction>) {
    for action in actions {
        let effect = match action {
            CallAction::StartRingtone => UiEffect::StartRingtone,
            CallAction::StopRingtone => UiEffect::StopRingtone,
            CallAction::Navigate { consultation_id, appointment_id } => {
                UiEffect::NavigateToCall { consultation_id, appointment_id }
            },
        };
        notify(effects, effect);
    }
}

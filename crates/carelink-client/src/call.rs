//! Incoming-call gate.
//!
//! Surfaces at most one unsolicited call prompt at a time and refuses to
//! re-prompt for a call the user already joined (a duplicate push while on
//! the call is a no-op). Process-wide state: constructed once at application
//! start, torn down at shutdown.
//!
//! Like the session core, this is a pure state machine: time arrives as a
//! parameter and side effects (ringtone, navigation) come back as actions.

use std::{ops::Sub, time::Duration};

use carelink_proto::payloads::IncomingCallPayload;

/// Default ring window before the prompt auto-dismisses as declined.
pub const DEFAULT_RING_TIMEOUT: Duration = Duration::from_millis(45_000);

/// Call prompt policy knobs.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long the prompt rings before auto-dismissing.
    pub ring_timeout: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self { ring_timeout: DEFAULT_RING_TIMEOUT }
    }
}

/// Side effects requested by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    /// Begin the ringtone loop.
    StartRingtone,
    /// Stop the ringtone loop.
    StopRingtone,
    /// Navigate into the accepted call.
    Navigate {
        /// Consultation to open.
        consultation_id: i64,
        /// Appointment the call belongs to.
        appointment_id: i64,
    },
}

/// Single-flight incoming-call prompt state.
///
/// The active-appointment id is independent of whether a prompt is showing:
/// it is set only by the call-session owner via [`IncomingCalls::set_active`]
/// and is the sole input that suppresses prompts for an ongoing call.
#[derive(Debug)]
pub struct IncomingCalls<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    pending: Option<IncomingCallPayload>,
    active_appointment: Option<i64>,
    ring_since: Option<I>,
    config: CallConfig,
}

impl<I> IncomingCalls<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a gate with no pending prompt and no active call.
    pub fn new(config: CallConfig) -> Self {
        Self { pending: None, active_appointment: None, ring_since: None, config }
    }

    /// Currently pending prompt, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&IncomingCallPayload> {
        self.pending.as_ref()
    }

    /// Appointment id of the call the user is currently in, if any.
    #[must_use]
    pub fn active_appointment(&self) -> Option<i64> {
        self.active_appointment
    }

    /// Offer an unsolicited call prompt.
    ///
    /// No-op while another prompt is showing, and for a call whose
    /// appointment the user is already in. Otherwise the prompt is armed
    /// with the ring deadline and the ringtone starts.
    pub fn offer(&mut self, data: IncomingCallPayload, now: I) -> Vec<CallAction> {
        if self.pending.is_some() || Some(data.appointment_id) == self.active_appointment {
            return vec![];
        }
        self.pending = Some(data);
        self.ring_since = Some(now);
        vec![CallAction::StartRingtone]
    }

    /// Auto-dismiss the prompt once the ring window expires.
    pub fn tick(&mut self, now: I) -> Vec<CallAction> {
        if let Some(since) = self.ring_since
            && now - since >= self.config.ring_timeout
        {
            return self.dismiss();
        }
        vec![]
    }

    /// Accept the pending call: clears the prompt and signals navigation.
    pub fn accept(&mut self) -> Vec<CallAction> {
        let Some(call) = self.pending.take() else {
            return vec![];
        };
        self.ring_since = None;
        vec![CallAction::StopRingtone, CallAction::Navigate {
            consultation_id: call.consultation_id,
            appointment_id: call.appointment_id,
        }]
    }

    /// Clear the pending prompt; used for explicit decline and for timeout
    /// expiry alike.
    pub fn dismiss(&mut self) -> Vec<CallAction> {
        self.ring_since = None;
        if self.pending.take().is_some() { vec![CallAction::StopRingtone] } else { vec![] }
    }

    /// Record that a call for `appointment_id` was actually joined.
    pub fn set_active(&mut self, appointment_id: i64) {
        self.active_appointment = Some(appointment_id);
    }

    /// Clear the active call, but only if it matches `appointment_id`.
    pub fn clear_active(&mut self, appointment_id: i64) {
        if self.active_appointment == Some(appointment_id) {
            self.active_appointment = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use carelink_core::env::{Environment, test_utils::MockEnv};

    use super::*;

    fn invite(appointment_id: i64) -> IncomingCallPayload {
        IncomingCallPayload {
            caller_name: "Dr. Adeyemi".to_string(),
            appointment_id,
            consultation_id: appointment_id * 10,
        }
    }

    fn gate() -> IncomingCalls<Instant> {
        IncomingCalls::new(CallConfig::default())
    }

    #[test]
    fn offer_arms_the_prompt_and_ringtone() {
        let env = MockEnv::new();
        let mut calls = gate();

        let actions = calls.offer(invite(4), env.now());

        assert_eq!(actions, vec![CallAction::StartRingtone]);
        assert_eq!(calls.pending().map(|c| c.appointment_id), Some(4));
    }

    #[test]
    fn second_offer_while_pending_is_ignored() {
        let env = MockEnv::new();
        let mut calls = gate();
        calls.offer(invite(4), env.now());

        assert!(calls.offer(invite(4), env.now()).is_empty());
        assert!(calls.offer(invite(9), env.now()).is_empty());
        assert_eq!(calls.pending().map(|c| c.appointment_id), Some(4));
    }

    #[test]
    fn duplicate_push_for_the_active_call_is_ignored() {
        let env = MockEnv::new();
        let mut calls = gate();
        calls.set_active(4);

        assert!(calls.offer(invite(4), env.now()).is_empty());
        assert!(calls.pending().is_none());

        // A different appointment still prompts.
        assert_eq!(calls.offer(invite(9), env.now()).len(), 1);
    }

    #[test]
    fn ring_timeout_dismisses_as_declined() {
        let env = MockEnv::new();
        let mut calls = gate();
        calls.offer(invite(4), env.now());

        env.advance(DEFAULT_RING_TIMEOUT - std::time::Duration::from_millis(1));
        assert!(calls.tick(env.now()).is_empty());

        env.advance(std::time::Duration::from_millis(1));
        let actions = calls.tick(env.now());
        assert_eq!(actions, vec![CallAction::StopRingtone]);
        assert!(calls.pending().is_none());

        // The deadline is disarmed along with the prompt.
        env.advance(DEFAULT_RING_TIMEOUT);
        assert!(calls.tick(env.now()).is_empty());
    }

    #[test]
    fn accept_clears_and_navigates() {
        let env = MockEnv::new();
        let mut calls = gate();
        calls.offer(invite(4), env.now());

        let actions = calls.accept();

        assert_eq!(actions, vec![CallAction::StopRingtone, CallAction::Navigate {
            consultation_id: 40,
            appointment_id: 4,
        }]);
        assert!(calls.pending().is_none());

        // Accept with nothing pending does nothing.
        assert!(calls.accept().is_empty());
    }

    #[test]
    fn clear_active_only_matches_its_own_id() {
        let mut calls = gate();
        calls.set_active(4);

        calls.clear_active(9);
        assert_eq!(calls.active_appointment(), Some(4));

        calls.clear_active(4);
        assert_eq!(calls.active_appointment(), None);
    }
}

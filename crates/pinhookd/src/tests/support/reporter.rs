//! Test double for [`ActivityReporter`] that records events for assertions.

use std::sync::Mutex;

use pinhook_config::Config;
use pinhook_rules::{DispatchRule, InputRule};
use pinhook_wire::Envelope;

use crate::actions::{ActionError, ActionOutcome};
use crate::bootstrap::{BootstrapError, Role};
use crate::dispatch::{DispatchSummary, ExitReason};
use crate::hardware::KeystrokeError;
use crate::poll::{PollError, PollSummary};
use crate::reporter::ActivityReporter;
use crate::transport::ChannelError;

/// Activity tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    BootstrapStarting(Role),
    BootstrapSucceeded(Role),
    BootstrapFailed(Role, String),
    EnvelopeReceived(String),
    FrameRejected,
    ChannelFailed(String),
    ActionStarted(String),
    ActionCompleted(String),
    ActionFailed(String),
    Acknowledged(String),
    AcknowledgementFailed,
    DispatchStopped(ExitReason),
    KeystrokeEmitted(String),
    KeystrokeFailed(String),
    PollStopped,
    PollFailed(String),
}

/// Records activity events for assertions.
#[derive(Debug, Default)]
pub struct RecordingActivityReporter {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingActivityReporter {
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events
            .lock()
            .expect("activity reporter mutex poisoned")
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&ActivityEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: ActivityEvent) {
        self.events
            .lock()
            .expect("activity reporter mutex poisoned")
            .push(event);
    }
}

impl ActivityReporter for RecordingActivityReporter {
    fn bootstrap_starting(&self, role: Role) {
        self.record(ActivityEvent::BootstrapStarting(role));
    }

    fn bootstrap_succeeded(&self, role: Role, _config: &Config) {
        self.record(ActivityEvent::BootstrapSucceeded(role));
    }

    fn bootstrap_failed(&self, role: Role, error: &BootstrapError) {
        self.record(ActivityEvent::BootstrapFailed(role, error.to_string()));
    }

    fn envelope_received(&self, envelope: &Envelope) {
        self.record(ActivityEvent::EnvelopeReceived(envelope.message().to_owned()));
    }

    fn frame_rejected(&self, _error: &ChannelError) {
        self.record(ActivityEvent::FrameRejected);
    }

    fn channel_failed(&self, error: &ChannelError) {
        self.record(ActivityEvent::ChannelFailed(error.to_string()));
    }

    fn action_started(&self, rule: &DispatchRule) {
        self.record(ActivityEvent::ActionStarted(rule.name().to_owned()));
    }

    fn action_completed(&self, rule: &DispatchRule, _outcome: &ActionOutcome) {
        self.record(ActivityEvent::ActionCompleted(rule.name().to_owned()));
    }

    fn action_failed(&self, rule: &DispatchRule, _error: &ActionError) {
        self.record(ActivityEvent::ActionFailed(rule.name().to_owned()));
    }

    fn acknowledged(&self, envelope: &Envelope) {
        self.record(ActivityEvent::Acknowledged(envelope.message().to_owned()));
    }

    fn acknowledgement_failed(&self, _error: &ChannelError) {
        self.record(ActivityEvent::AcknowledgementFailed);
    }

    fn dispatch_stopped(&self, summary: &DispatchSummary) {
        self.record(ActivityEvent::DispatchStopped(summary.exit));
    }

    fn keystroke_emitted(&self, rule: &InputRule) {
        self.record(ActivityEvent::KeystrokeEmitted(rule.keystroke().to_owned()));
    }

    fn keystroke_failed(&self, rule: &InputRule, _error: &KeystrokeError) {
        self.record(ActivityEvent::KeystrokeFailed(rule.keystroke().to_owned()));
    }

    fn poll_stopped(&self, _summary: &PollSummary) {
        self.record(ActivityEvent::PollStopped);
    }

    fn poll_failed(&self, error: &PollError) {
        self.record(ActivityEvent::PollFailed(error.to_string()));
    }
}

//! Structured activity reporting for the dispatch and poll engines.

use std::sync::Arc;

use pinhook_config::Config;
use pinhook_rules::{DispatchRule, InputRule};
use pinhook_wire::Envelope;

use crate::actions::{ActionError, ActionOutcome};
use crate::bootstrap::{BootstrapError, Role};
use crate::dispatch::DispatchSummary;
use crate::hardware::KeystrokeError;
use crate::poll::{PollError, PollSummary};
use crate::transport::ChannelError;

const ACTIVITY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::activity");

/// Observer of everything the engine does that an operator may care about.
pub trait ActivityReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self, role: Role);

    /// Invoked after configuration and rules loaded successfully.
    fn bootstrap_succeeded(&self, role: Role, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, role: Role, error: &BootstrapError);

    /// Invoked for every decoded envelope.
    fn envelope_received(&self, envelope: &Envelope);

    /// Invoked when a frame is dropped as malformed.
    fn frame_rejected(&self, error: &ChannelError);

    /// Invoked when the channel fails for good.
    fn channel_failed(&self, error: &ChannelError);

    /// Invoked before a rule's action starts driving its pin.
    fn action_started(&self, rule: &DispatchRule);

    /// Invoked after a rule's action completed.
    fn action_completed(&self, rule: &DispatchRule, outcome: &ActionOutcome);

    /// Invoked when a rule's action failed.
    fn action_failed(&self, rule: &DispatchRule, error: &ActionError);

    /// Invoked after an envelope was echoed back.
    fn acknowledged(&self, envelope: &Envelope);

    /// Invoked when the echo could not be written.
    fn acknowledgement_failed(&self, error: &ChannelError);

    /// Invoked once the dispatch loop has stopped.
    fn dispatch_stopped(&self, summary: &DispatchSummary);

    /// Invoked after a keystroke was emitted for an input rule.
    fn keystroke_emitted(&self, rule: &InputRule);

    /// Invoked when emitting a keystroke failed.
    fn keystroke_failed(&self, rule: &InputRule, error: &KeystrokeError);

    /// Invoked once the poll loop has stopped cleanly.
    fn poll_stopped(&self, summary: &PollSummary);

    /// Invoked when the poll loop stops on a pin failure.
    fn poll_failed(&self, error: &PollError);
}

impl<T> ActivityReporter for Arc<T>
where
    T: ActivityReporter + ?Sized,
{
    fn bootstrap_starting(&self, role: Role) {
        (**self).bootstrap_starting(role);
    }

    fn bootstrap_succeeded(&self, role: Role, config: &Config) {
        (**self).bootstrap_succeeded(role, config);
    }

    fn bootstrap_failed(&self, role: Role, error: &BootstrapError) {
        (**self).bootstrap_failed(role, error);
    }

    fn envelope_received(&self, envelope: &Envelope) {
        (**self).envelope_received(envelope);
    }

    fn frame_rejected(&self, error: &ChannelError) {
        (**self).frame_rejected(error);
    }

    fn channel_failed(&self, error: &ChannelError) {
        (**self).channel_failed(error);
    }

    fn action_started(&self, rule: &DispatchRule) {
        (**self).action_started(rule);
    }

    fn action_completed(&self, rule: &DispatchRule, outcome: &ActionOutcome) {
        (**self).action_completed(rule, outcome);
    }

    fn action_failed(&self, rule: &DispatchRule, error: &ActionError) {
        (**self).action_failed(rule, error);
    }

    fn acknowledged(&self, envelope: &Envelope) {
        (**self).acknowledged(envelope);
    }

    fn acknowledgement_failed(&self, error: &ChannelError) {
        (**self).acknowledgement_failed(error);
    }

    fn dispatch_stopped(&self, summary: &DispatchSummary) {
        (**self).dispatch_stopped(summary);
    }

    fn keystroke_emitted(&self, rule: &InputRule) {
        (**self).keystroke_emitted(rule);
    }

    fn keystroke_failed(&self, rule: &InputRule, error: &KeystrokeError) {
        (**self).keystroke_failed(rule, error);
    }

    fn poll_stopped(&self, summary: &PollSummary) {
        (**self).poll_stopped(summary);
    }

    fn poll_failed(&self, error: &PollError) {
        (**self).poll_failed(error);
    }
}

/// Default reporter that records activity using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredActivityReporter;

impl StructuredActivityReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ActivityReporter for StructuredActivityReporter {
    fn bootstrap_starting(&self, role: Role) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "bootstrap_starting",
            %role,
            "starting bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, role: Role, config: &Config) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "bootstrap_succeeded",
            %role,
            pipes = %config.pipe_endpoint(),
            output_rules = ?config.output_rules(),
            input_rules = ?config.input_rules(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, role: Role, error: &BootstrapError) {
        tracing::error!(
            target: ACTIVITY_TARGET,
            event = "bootstrap_failed",
            %role,
            error = %error,
            "bootstrap failed"
        );
    }

    fn envelope_received(&self, envelope: &Envelope) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "envelope_received",
            id = envelope.payload().id.as_deref(),
            timestamp = envelope.timestamp(),
            message = envelope.message(),
            "envelope received"
        );
    }

    fn frame_rejected(&self, error: &ChannelError) {
        tracing::warn!(
            target: ACTIVITY_TARGET,
            event = "frame_rejected",
            error = %error,
            "dropping malformed frame"
        );
    }

    fn channel_failed(&self, error: &ChannelError) {
        tracing::error!(
            target: ACTIVITY_TARGET,
            event = "channel_failed",
            error = %error,
            "channel failed"
        );
    }

    fn action_started(&self, rule: &DispatchRule) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "action_started",
            rule = rule.name(),
            rule_event = %rule.event(),
            pin = rule.pin().get(),
            mode = %rule.mode(),
            duration_ms = rule.duration().as_millis(),
            "action started"
        );
    }

    fn action_completed(&self, rule: &DispatchRule, outcome: &ActionOutcome) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "action_completed",
            rule = rule.name(),
            pin = outcome.pin().get(),
            mode = %outcome.mode(),
            elapsed_ms = outcome.elapsed().as_millis(),
            writes = outcome.writes(),
            "action completed"
        );
    }

    fn action_failed(&self, rule: &DispatchRule, error: &ActionError) {
        tracing::error!(
            target: ACTIVITY_TARGET,
            event = "action_failed",
            rule = rule.name(),
            pin = rule.pin().get(),
            error = %error,
            "action failed"
        );
    }

    fn acknowledged(&self, envelope: &Envelope) {
        tracing::debug!(
            target: ACTIVITY_TARGET,
            event = "acknowledged",
            message = envelope.message(),
            "acknowledgement sent"
        );
    }

    fn acknowledgement_failed(&self, error: &ChannelError) {
        tracing::warn!(
            target: ACTIVITY_TARGET,
            event = "acknowledgement_failed",
            error = %error,
            "failed to send acknowledgement"
        );
    }

    fn dispatch_stopped(&self, summary: &DispatchSummary) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "dispatch_stopped",
            reason = %summary.exit,
            received = summary.received,
            acknowledged = summary.acknowledged,
            malformed = summary.malformed,
            failed_actions = summary.failed_actions,
            "dispatch loop stopped"
        );
    }

    fn keystroke_emitted(&self, rule: &InputRule) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "keystroke_emitted",
            rule = rule.name(),
            pin = rule.pin().get(),
            keystroke = rule.keystroke(),
            "keystroke emitted"
        );
    }

    fn keystroke_failed(&self, rule: &InputRule, error: &KeystrokeError) {
        tracing::warn!(
            target: ACTIVITY_TARGET,
            event = "keystroke_failed",
            rule = rule.name(),
            pin = rule.pin().get(),
            error = %error,
            "failed to emit keystroke"
        );
    }

    fn poll_stopped(&self, summary: &PollSummary) {
        tracing::info!(
            target: ACTIVITY_TARGET,
            event = "poll_stopped",
            samples = summary.samples,
            keystrokes = summary.keystrokes,
            failed_keystrokes = summary.failed_keystrokes,
            "poll loop stopped"
        );
    }

    fn poll_failed(&self, error: &PollError) {
        tracing::error!(
            target: ACTIVITY_TARGET,
            event = "poll_failed",
            error = %error,
            "poll loop failed"
        );
    }
}

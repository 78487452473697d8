//! Input pin poller.
//!
//! Samples every input rule's pin once per interval and emits the rule's
//! keystroke on a rising edge. A pin held high does not repeat the
//! keystroke; it must return low first.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use pinhook_rules::{InputRuleSet, PinId};

use crate::actions::Clock;
use crate::hardware::{Direction, KeystrokeEmitter, Level, PinDriver, PinError, PinReleaseGuard};
use crate::process::ShutdownFlag;
use crate::reporter::{ActivityReporter, StructuredActivityReporter};

const POLL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::poll");

/// Pause after a keystroke before sampling the next rule.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Errors that stop the poller.
#[derive(Debug, Error)]
pub enum PollError {
    /// An input pin could not be configured.
    #[error("failed to configure input pin {pin}: {source}")]
    Configure {
        /// Offending pin.
        pin: PinId,
        /// Driver error.
        #[source]
        source: PinError,
    },
    /// Sampling an input pin failed.
    #[error("failed to sample pin {pin} for rule '{rule}': {source}")]
    Pin {
        /// Rule being sampled.
        rule: String,
        /// Offending pin.
        pin: PinId,
        /// Driver error.
        #[source]
        source: PinError,
    },
}

/// Counters collected over one run of the poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Completed sampling passes over all rules.
    pub samples: usize,
    /// Keystrokes emitted.
    pub keystrokes: usize,
    /// Keystrokes that failed to emit.
    pub failed_keystrokes: usize,
}

/// Turns input pin edges into keystrokes.
pub struct PollDispatcher<P, K, C> {
    rules: InputRuleSet,
    driver: P,
    emitter: K,
    clock: C,
    reporter: Arc<dyn ActivityReporter>,
    shutdown: ShutdownFlag,
    interval: Duration,
    settle: Duration,
}

impl<P, K, C> PollDispatcher<P, K, C>
where
    P: PinDriver,
    K: KeystrokeEmitter,
    C: Clock,
{
    /// Builds a poller sampling every `interval`.
    pub fn new(rules: InputRuleSet, driver: P, emitter: K, clock: C, interval: Duration) -> Self {
        Self {
            rules,
            driver,
            emitter,
            clock,
            reporter: Arc::new(StructuredActivityReporter::new()),
            shutdown: ShutdownFlag::new(),
            interval,
            settle: SETTLE_DELAY,
        }
    }

    /// Replaces the activity reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ActivityReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Shares `shutdown` with whoever decides when to stop.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Configures the input pins and polls until shutdown.
    ///
    /// Pins are released on every exit path, including a panic unwinding
    /// through the loop.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Configure`] when an input pin cannot be
    /// configured and [`PollError::Pin`] when sampling fails.
    pub fn run(self) -> Result<PollSummary, PollError> {
        let Self {
            rules,
            driver,
            mut emitter,
            clock,
            reporter,
            shutdown,
            interval,
            settle,
        } = self;
        let mut driver = PinReleaseGuard::new(driver);

        let result = configure_inputs(&mut *driver, &rules).and_then(|()| {
            let mut previous = vec![None; rules.len()];
            let mut summary = PollSummary::default();
            while !shutdown.is_set() {
                for (rule, last) in rules.iter().zip(previous.iter_mut()) {
                    let level = driver.read(rule.pin()).map_err(|source| PollError::Pin {
                        rule: rule.name().to_owned(),
                        pin: rule.pin(),
                        source,
                    })?;
                    let rising = level == Level::High && *last != Some(Level::High);
                    *last = Some(level);
                    if !rising {
                        continue;
                    }
                    match emitter.emit(rule.keystroke()) {
                        Ok(()) => {
                            summary.keystrokes += 1;
                            reporter.keystroke_emitted(rule);
                        }
                        Err(error) => {
                            summary.failed_keystrokes += 1;
                            reporter.keystroke_failed(rule, &error);
                        }
                    }
                    clock.sleep(settle);
                }
                summary.samples += 1;
                clock.sleep(interval);
            }
            Ok(summary)
        });

        match &result {
            Ok(summary) => reporter.poll_stopped(summary),
            Err(error) => reporter.poll_failed(error),
        }
        result
    }
}

fn configure_inputs<P>(driver: &mut P, rules: &InputRuleSet) -> Result<(), PollError>
where
    P: PinDriver,
{
    for pin in rules.input_pins() {
        driver
            .configure(pin, Direction::Input)
            .map_err(|source| PollError::Configure { pin, source })?;
        debug!(target: POLL_TARGET, pin = pin.get(), "input pin ready");
    }
    Ok(())
}

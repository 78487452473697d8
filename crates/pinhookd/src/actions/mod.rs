//! Pin actions performed when a dispatch rule fires.
//!
//! An [`ActionMapper`] owns a pin driver and a clock and runs one rule at a
//! time: the pin goes from idle to driven and, for timed modes, back to low
//! before [`ActionMapper::execute`] returns. No action blocks for longer than
//! the rule's clamped duration.

mod clock;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use pinhook_rules::{ActionMode, DispatchRule, PinId};

use crate::hardware::{Direction, Level, PinDriver, PinError};
use crate::reporter::ActivityReporter;

pub use self::clock::{Clock, SystemClock};
#[cfg(test)]
pub(crate) use self::clock::test_support::VirtualClock;

/// Errors raised while running an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The pin driver rejected a write.
    #[error("action for rule '{rule}' failed: {source}")]
    Pin {
        /// Rule whose action failed.
        rule: String,
        /// Driver error.
        #[source]
        source: PinError,
    },
}

/// What a completed action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pin: PinId,
    mode: ActionMode,
    elapsed: Duration,
    writes: usize,
}

impl ActionOutcome {
    /// Pin the action drove.
    #[must_use]
    pub const fn pin(&self) -> PinId {
        self.pin
    }

    /// Mode that ran.
    #[must_use]
    pub const fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Time spent inside the action, as measured by the mapper's clock.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of pin writes performed.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

/// Runs rule actions against a pin driver.
pub struct ActionMapper<P, C> {
    driver: P,
    clock: C,
    reporter: Arc<dyn ActivityReporter>,
}

impl<P, C> ActionMapper<P, C>
where
    P: PinDriver,
    C: Clock,
{
    /// Builds a mapper over `driver` and `clock`.
    pub fn new(driver: P, clock: C, reporter: Arc<dyn ActivityReporter>) -> Self {
        Self {
            driver,
            clock,
            reporter,
        }
    }

    /// Configures every pin in `pins` as an output.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub fn prepare<I>(&mut self, pins: I) -> Result<(), PinError>
    where
        I: IntoIterator<Item = PinId>,
    {
        pins.into_iter()
            .try_for_each(|pin| self.driver.configure(pin, Direction::Output))
    }

    /// Runs the action of `rule`, blocking for timed modes.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Pin`] when a pin write fails. The failure is
    /// also reported to the activity reporter.
    pub fn execute(&mut self, rule: &DispatchRule) -> Result<ActionOutcome, ActionError> {
        self.reporter.action_started(rule);
        let started = self.clock.now();
        match self.drive(rule, started) {
            Ok(writes) => {
                let outcome = ActionOutcome {
                    pin: rule.pin(),
                    mode: rule.mode(),
                    elapsed: self.clock.now().saturating_duration_since(started),
                    writes,
                };
                self.reporter.action_completed(rule, &outcome);
                Ok(outcome)
            }
            Err(source) => {
                let error = ActionError::Pin {
                    rule: rule.name().to_owned(),
                    source,
                };
                self.reporter.action_failed(rule, &error);
                Err(error)
            }
        }
    }

    fn drive(&mut self, rule: &DispatchRule, started: Instant) -> Result<usize, PinError> {
        let pin = rule.pin();
        match rule.mode() {
            ActionMode::ConstantOn => self.driver.write(pin, Level::High).map(|()| 1),
            ActionMode::ConstantOff => self.driver.write(pin, Level::Low).map(|()| 1),
            ActionMode::SinglePulse => {
                self.driver.write(pin, Level::High)?;
                self.clock.sleep(rule.duration());
                self.driver.write(pin, Level::Low)?;
                Ok(2)
            }
            mode @ (ActionMode::FastBlink | ActionMode::SlowBlink) => {
                let half_period = mode.half_period().unwrap_or(rule.duration());
                self.blink(pin, half_period, rule.duration(), started)
            }
        }
    }

    fn blink(
        &mut self,
        pin: PinId,
        half_period: Duration,
        budget: Duration,
        started: Instant,
    ) -> Result<usize, PinError> {
        let mut writes = 0;
        let mut level = Level::High;
        loop {
            let elapsed = self.clock.now().saturating_duration_since(started);
            let Some(remaining) = budget.checked_sub(elapsed).filter(|left| !left.is_zero())
            else {
                break;
            };
            self.driver.write(pin, level)?;
            writes += 1;
            self.clock.sleep(half_period.min(remaining));
            level = !level;
        }
        self.driver.write(pin, Level::Low)?;
        Ok(writes + 1)
    }
}

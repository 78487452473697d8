//! Message dispatch loop.
//!
//! The loop receives one frame at a time, fires every rule whose trigger
//! matches the message, then echoes the envelope back as an
//! acknowledgement. It stops on the bare `exit` frame, on a message that
//! contains `exit` (without acknowledging it), on shutdown, or when the
//! channel fails for good.

mod errors;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use pinhook_rules::RuleSet;
use pinhook_wire::{Envelope, Inbound};

use crate::actions::{ActionMapper, Clock};
use crate::hardware::{PinDriver, PinReleaseGuard};
use crate::process::ShutdownFlag;
use crate::reporter::{ActivityReporter, StructuredActivityReporter};
use crate::transport::{ChannelError, ChannelTransport};

pub use self::errors::DispatchError;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Pause after an empty frame before listening again.
pub const IDLE_BACKOFF: Duration = Duration::from_secs(1);

/// Why the dispatch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The bare `exit` frame arrived.
    Sentinel,
    /// A message containing `exit` arrived; it was dispatched but not acknowledged.
    ExitMessage,
    /// The shutdown flag was raised.
    Shutdown,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Sentinel => "sentinel",
            Self::ExitMessage => "exit_message",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Counters collected over one run of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Envelopes decoded.
    pub received: usize,
    /// Acknowledgements written.
    pub acknowledged: usize,
    /// Frames dropped as malformed.
    pub malformed: usize,
    /// Actions that failed.
    pub failed_actions: usize,
    /// Why the loop stopped.
    pub exit: ExitReason,
}

#[derive(Debug, Default)]
struct Counters {
    received: usize,
    acknowledged: usize,
    malformed: usize,
    failed_actions: usize,
}

impl Counters {
    const fn finish(&self, exit: ExitReason) -> DispatchSummary {
        DispatchSummary {
            received: self.received,
            acknowledged: self.acknowledged,
            malformed: self.malformed,
            failed_actions: self.failed_actions,
            exit,
        }
    }
}

enum Step {
    Continue,
    Idle,
    Stop(ExitReason),
}

/// Drives rule actions from inbound messages.
pub struct DispatchLoop<T, P, C> {
    transport: T,
    rules: RuleSet,
    driver: P,
    clock: C,
    reporter: Arc<dyn ActivityReporter>,
    shutdown: ShutdownFlag,
    idle_backoff: Duration,
}

impl<T, P, C> DispatchLoop<T, P, C>
where
    T: ChannelTransport,
    P: PinDriver,
    C: Clock,
{
    /// Builds a loop with structured reporting and a private shutdown flag.
    pub fn new(transport: T, rules: RuleSet, driver: P, clock: C) -> Self {
        Self {
            transport,
            rules,
            driver,
            clock,
            reporter: Arc::new(StructuredActivityReporter::new()),
            shutdown: ShutdownFlag::new(),
            idle_backoff: IDLE_BACKOFF,
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

    /// Replaces the pause after an empty frame.
    #[must_use]
    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    /// Configures the output pins and runs until an exit condition.
    ///
    /// The channel is closed and the pins are released on every return path.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configure`] when an output pin cannot be
    /// configured and [`DispatchError::Channel`] when the channel fails with
    /// anything other than a malformed frame.
    pub fn run(self) -> Result<DispatchSummary, DispatchError> {
        let Self {
            mut transport,
            rules,
            driver,
            clock,
            reporter,
            shutdown,
            idle_backoff,
        } = self;
        let mut guard = PinReleaseGuard::new(driver);
        let mut mapper = ActionMapper::new(&mut *guard, &clock, Arc::clone(&reporter));
        if let Err(source) = mapper.prepare(rules.output_pins()) {
            transport.close();
            return Err(DispatchError::Configure { source });
        }

        let mut session = Session {
            rules: &rules,
            mapper,
            reporter: reporter.as_ref(),
            counters: Counters::default(),
        };
        let result = loop {
            if shutdown.is_set() {
                break Ok(ExitReason::Shutdown);
            }
            match session.step(&mut transport) {
                Ok(Step::Continue) => {}
                Ok(Step::Idle) => {
                    debug!(target: DISPATCH_TARGET, "empty frame, backing off");
                    clock.sleep(idle_backoff);
                }
                Ok(Step::Stop(reason)) => break Ok(reason),
                Err(error) => break Err(error),
            }
        };
        transport.close();

        match result {
            Ok(reason) => {
                let summary = session.counters.finish(reason);
                reporter.dispatch_stopped(&summary);
                Ok(summary)
            }
            Err(source) => {
                reporter.channel_failed(&source);
                Err(DispatchError::Channel { source })
            }
        }
    }
}

struct Session<'a, P, C> {
    rules: &'a RuleSet,
    mapper: ActionMapper<P, C>,
    reporter: &'a dyn ActivityReporter,
    counters: Counters,
}

impl<P, C> Session<'_, P, C>
where
    P: PinDriver,
    C: Clock,
{
    fn step<T>(&mut self, transport: &mut T) -> Result<Step, ChannelError>
    where
        T: ChannelTransport,
    {
        let envelope = match transport.receive() {
            Ok(Inbound::Envelope(envelope)) => envelope,
            Ok(Inbound::Empty) => return Ok(Step::Idle),
            Ok(Inbound::Sentinel) => return Ok(Step::Stop(ExitReason::Sentinel)),
            Err(error) if error.is_recoverable() => {
                self.counters.malformed += 1;
                self.reporter.frame_rejected(&error);
                return Ok(Step::Continue);
            }
            Err(error) => return Err(error),
        };

        self.counters.received += 1;
        self.reporter.envelope_received(&envelope);
        self.fire_rules(&envelope);

        if envelope.requests_exit() {
            return Ok(Step::Stop(ExitReason::ExitMessage));
        }
        match transport.send(&envelope) {
            Ok(()) => {
                self.counters.acknowledged += 1;
                self.reporter.acknowledged(&envelope);
            }
            Err(error) => self.reporter.acknowledgement_failed(&error),
        }
        Ok(Step::Continue)
    }

    fn fire_rules(&mut self, envelope: &Envelope) {
        for rule in self.rules.matches(envelope.message()) {
            if self.mapper.execute(rule).is_err() {
                self.counters.failed_actions += 1;
            }
        }
    }
}

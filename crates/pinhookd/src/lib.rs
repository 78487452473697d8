//! Pipe-driven GPIO dispatcher and input poller.
//!
//! Two engines share this crate. The dispatcher reads JSON envelopes from a
//! named pipe, fires every output rule whose trigger appears in the message
//! and echoes the envelope back as an acknowledgement. The poller samples
//! input pins and turns each rising edge into a synthesised keystroke.
//!
//! Both engines follow the same startup sequence: load configuration through
//! [`ConfigLoader`], initialise structured telemetry, load and cross-check
//! the rule files, then run a loop until a sentinel, an error or a
//! termination signal stops it. Pins are released on every exit path.
//!
//! The physical side is reached only through the [`PinDriver`] and
//! [`KeystrokeEmitter`] capabilities, and every notable event flows through
//! an injected [`ActivityReporter`].

mod actions;
mod bootstrap;
mod dispatch;
mod hardware;
mod poll;
mod process;
mod reporter;
pub mod telemetry;
mod transport;

pub use actions::{ActionError, ActionMapper, ActionOutcome, Clock, SystemClock};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Role, Runtime, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::{DispatchError, DispatchLoop, DispatchSummary, ExitReason, IDLE_BACKOFF};
pub use hardware::{
    CommandKeystrokeEmitter, Direction, KeystrokeEmitter, KeystrokeError, Level, PinDriver,
    PinError, PinReleaseGuard, SysfsPinDriver,
};
pub use poll::{PollDispatcher, PollError, PollSummary, SETTLE_DELAY};
pub use process::{
    LaunchError, ShutdownError, ShutdownFlag, ShutdownSignal, SystemShutdownSignal,
    run_dispatcher, run_poller,
};
pub use reporter::{ActivityReporter, StructuredActivityReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ChannelError, ChannelTransport, NamedPipeChannel, wake_reader};

#[cfg(test)]
mod tests;

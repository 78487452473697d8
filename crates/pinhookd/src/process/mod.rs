//! Process lifecycle for the pinhook binaries.

mod errors;
mod flag;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use flag::ShutdownFlag;
pub use launch::{run_dispatcher, run_poller};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

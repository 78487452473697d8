//! Test harness utilities shared by unit and behaviour suites.

mod config_loader;
mod keys;
mod pins;
mod process;
mod reporter;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use keys::{MockKeystrokeEmitter, RecordingKeystrokeEmitter};
pub use pins::{MockPinDriver, PinCall, RecordingPinDriver};
pub use process::{ScriptedShutdownSignal, ShutdownTrigger, TestHardware};
pub use reporter::{ActivityEvent, RecordingActivityReporter};

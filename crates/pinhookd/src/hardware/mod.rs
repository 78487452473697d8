//! Capabilities for the physical side of the engine: pins and keystrokes.
//!
//! Both capabilities are traits with a single production adapter each. The
//! dispatch and poll loops are generic over them so behaviour tests can swap
//! in recording doubles without touching sysfs or spawning processes.

mod guard;
mod keys;
mod pins;
mod sysfs;

pub use guard::PinReleaseGuard;
pub use keys::{CommandKeystrokeEmitter, KeystrokeEmitter, KeystrokeError};
pub use pins::{Direction, Level, PinDriver, PinError};
pub use sysfs::SysfsPinDriver;

pub(crate) const HARDWARE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::hardware");

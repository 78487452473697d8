//! Pin driver capability.

use std::fmt;
use std::io;
use std::ops::Not;

use camino::Utf8PathBuf;
use pinhook_rules::PinId;
use thiserror::Error;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Logic 0.
    Low,
    /// Logic 1.
    High,
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value { Self::High } else { Self::Low }
    }
}

impl Not for Level {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Low => "low",
            Self::High => "high",
        })
    }
}

/// Direction a pin is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sampled by the poller.
    Input,
    /// Driven by the dispatcher.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Input => "in",
            Self::Output => "out",
        })
    }
}

/// Errors reported by pin drivers.
#[derive(Debug, Error)]
pub enum PinError {
    /// The pin was used before being configured.
    #[error("pin {pin} is not configured")]
    Unconfigured {
        /// Offending pin.
        pin: PinId,
    },
    /// The pin is configured for the other direction.
    #[error("pin {pin} is configured as {configured}")]
    WrongDirection {
        /// Offending pin.
        pin: PinId,
        /// Direction the pin was configured with.
        configured: Direction,
    },
    /// The underlying interface rejected the operation.
    #[error("failed to {operation} pin {pin} via '{path}': {source}")]
    Io {
        /// Offending pin.
        pin: PinId,
        /// Operation being performed.
        operation: &'static str,
        /// File touched by the operation.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The interface returned a value that is not a logic level.
    #[error("pin {pin} reported unexpected value '{value}'")]
    InvalidValue {
        /// Offending pin.
        pin: PinId,
        /// Raw value read.
        value: String,
    },
}

/// Configures, drives and samples pins.
pub trait PinDriver {
    /// Prepares `pin` for use in `direction`. Output pins start low.
    fn configure(&mut self, pin: PinId, direction: Direction) -> Result<(), PinError>;

    /// Drives an output pin.
    fn write(&mut self, pin: PinId, level: Level) -> Result<(), PinError>;

    /// Samples a configured pin.
    fn read(&mut self, pin: PinId) -> Result<Level, PinError>;

    /// Returns every configured pin to the system, driving outputs low first.
    fn release_all(&mut self) -> Result<(), PinError>;
}

impl<P> PinDriver for &mut P
where
    P: PinDriver + ?Sized,
{
    fn configure(&mut self, pin: PinId, direction: Direction) -> Result<(), PinError> {
        (**self).configure(pin, direction)
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), PinError> {
        (**self).write(pin, level)
    }

    fn read(&mut self, pin: PinId) -> Result<Level, PinError> {
        (**self).read(pin)
    }

    fn release_all(&mut self) -> Result<(), PinError> {
        (**self).release_all()
    }
}

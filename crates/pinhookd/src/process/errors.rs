//! Defines the unified error surface for the pinhook binaries.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::dispatch::DispatchError;
use crate::poll::PollError;
use crate::transport::ChannelError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or running an engine.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping failed.
    #[error("bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Signal handling could not be set up.
    #[error("shutdown handling failed: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The pipe pair could not be opened.
    #[error("failed to open pipes: {source}")]
    Channel {
        /// Underlying channel error.
        #[source]
        source: ChannelError,
    },
    /// The dispatch loop stopped on an error.
    #[error("dispatcher stopped: {source}")]
    Dispatch {
        /// Underlying dispatch error.
        #[source]
        source: DispatchError,
    },
    /// The poll loop stopped on an error.
    #[error("poller stopped: {source}")]
    Poll {
        /// Underlying poll error.
        #[source]
        source: PollError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<ChannelError> for LaunchError {
    fn from(source: ChannelError) -> Self {
        Self::Channel { source }
    }
}

impl From<DispatchError> for LaunchError {
    fn from(source: DispatchError) -> Self {
        Self::Dispatch { source }
    }
}

impl From<PollError> for LaunchError {
    fn from(source: PollError) -> Self {
        Self::Poll { source }
    }
}

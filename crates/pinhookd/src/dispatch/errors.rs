//! Error types for the dispatch loop.

use thiserror::Error;

use crate::hardware::PinError;
use crate::transport::ChannelError;

/// Errors that stop the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The channel failed in a way that cannot be skipped.
    #[error("channel failed: {source}")]
    Channel {
        /// Underlying channel error.
        #[source]
        source: ChannelError,
    },
    /// An output pin could not be configured.
    #[error("failed to configure output pins: {source}")]
    Configure {
        /// Underlying driver error.
        #[source]
        source: PinError,
    },
}

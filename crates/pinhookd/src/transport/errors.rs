//! Error types for the pipe transport.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use pinhook_wire::WireError;

/// Errors surfaced while opening or using the channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A pipe could not be created or opened.
    #[error("pipe '{path}' is unavailable: {source}")]
    Unavailable {
        /// Pipe path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A frame did not decode to an envelope.
    #[error("malformed envelope: {source}")]
    MalformedEnvelope {
        /// Decoder error.
        #[source]
        source: WireError,
    },
    /// Reading the inbound pipe failed.
    #[error("failed to read inbound pipe: {source}")]
    Read {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the outbound pipe failed.
    #[error("failed to write outbound pipe: {source}")]
    Write {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The outgoing value could not be serialised.
    #[error("failed to serialise outbound frame: {source}")]
    Serialize {
        /// Encoder error.
        #[source]
        source: WireError,
    },
    /// The outgoing frame exceeds the frame limit.
    #[error("outbound frame of {size} bytes exceeds the {max_size} byte limit")]
    FrameTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Limit in bytes.
        max_size: usize,
    },
}

impl ChannelError {
    /// Whether the dispatch loop may drop the frame and keep listening.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedEnvelope { .. })
    }

    pub(crate) fn from_encode(source: WireError) -> Self {
        match source {
            WireError::FrameTooLarge { size, max_size } => Self::FrameTooLarge { size, max_size },
            other => Self::Serialize { source: other },
        }
    }
}

use std::fmt;
use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the pipe the dispatcher reads from.
pub const INBOUND_PIPE_NAME: &str = "pipe.in";

/// File name of the pipe the dispatcher writes acknowledgements to.
pub const OUTBOUND_PIPE_NAME: &str = "pipe.out";

/// Location of the named pipe pair shared by the dispatcher and producers.
///
/// Both ends derive their paths from the same base directory, so agreeing on
/// the directory is the only out-of-band coordination needed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PipeEndpoint {
    base: Utf8PathBuf,
}

impl PipeEndpoint {
    /// Builds an endpoint rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding both pipes.
    #[must_use]
    pub fn base(&self) -> &Utf8Path {
        self.base.as_path()
    }

    /// Path of the pipe carrying producer messages to the dispatcher.
    #[must_use]
    pub fn inbound(&self) -> Utf8PathBuf {
        self.base.join(INBOUND_PIPE_NAME)
    }

    /// Path of the pipe carrying acknowledgements back to the producer.
    #[must_use]
    pub fn outbound(&self) -> Utf8PathBuf {
        self.base.join(OUTBOUND_PIPE_NAME)
    }

    /// Ensures the pipe directory exists with restrictive permissions.
    pub fn prepare_filesystem(&self) -> Result<(), PipePreparationError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(self.base.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(PipePreparationError::CreateDirectory {
                path: self.base.clone(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for PipeEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{{{INBOUND_PIPE_NAME},{OUTBOUND_PIPE_NAME}}}", self.base)
    }
}

/// Errors raised when preparing the pipe directory.
#[derive(Debug, Error)]
pub enum PipePreparationError {
    /// Failed to create the pipe directory.
    #[error("failed to create pipe directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

//! Frame decoding and encoding.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::envelope::Envelope;

/// Largest frame read from or written to a pipe, in bytes.
pub const MAX_FRAME_BYTES: usize = 4096;

/// Reserved word that terminates the dispatch loop.
pub const EXIT_SENTINEL: &str = "exit";

/// Errors surfaced while decoding or encoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// The frame was not a well-formed envelope.
    #[error("malformed envelope: {message}")]
    Malformed {
        /// Human-readable description of the defect.
        message: String,
        /// Underlying JSON error, when parsing failed.
        #[source]
        source: Option<serde_json::Error>,
    },
    /// An encoded frame would exceed [`MAX_FRAME_BYTES`].
    #[error("frame of {size} bytes exceeds the {max_size} byte limit")]
    FrameTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Maximum permitted size in bytes.
        max_size: usize,
    },
    /// Serialising a value to JSON failed.
    #[error("failed to serialise frame: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl WireError {
    /// Creates a malformed envelope error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed envelope error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }
}

/// Classification of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Nothing to dispatch: a zero-length read, whitespace, or `{}`.
    Empty,
    /// The bare `exit` frame.
    Sentinel,
    /// A decoded envelope.
    Envelope(Envelope),
}

/// Decodes one frame read from the inbound pipe.
///
/// # Errors
///
/// Returns [`WireError::Malformed`] when the frame is not UTF-8, not JSON, not
/// a JSON object, or lacks `payload.message`.
pub fn decode_frame(bytes: &[u8]) -> Result<Inbound, WireError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|error| WireError::malformed(format!("frame is not UTF-8: {error}")))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Inbound::Empty);
    }
    if trimmed == EXIT_SENTINEL {
        return Ok(Inbound::Sentinel);
    }

    match serde_json::from_str::<Value>(trimmed).map_err(WireError::from_json_error)? {
        Value::Object(document) if document.is_empty() => Ok(Inbound::Empty),
        Value::Object(document) => Envelope::from_document(document).map(Inbound::Envelope),
        Value::String(word) if word == EXIT_SENTINEL => Ok(Inbound::Sentinel),
        _ => Err(WireError::malformed("expected a JSON object")),
    }
}

/// Serialises `value` into a single frame.
///
/// # Errors
///
/// Returns [`WireError::Serialize`] when serialisation fails and
/// [`WireError::FrameTooLarge`] when the encoded frame exceeds
/// [`MAX_FRAME_BYTES`].
pub fn encode_frame<T>(value: &T) -> Result<Vec<u8>, WireError>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(WireError::Serialize)?;
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge {
            size: bytes.len(),
            max_size: MAX_FRAME_BYTES,
        });
    }
    Ok(bytes)
}

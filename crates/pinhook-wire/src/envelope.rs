//! The structured message unit carried over the pipes.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::frame::{EXIT_SENTINEL, WireError};

/// Addressed content of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payload {
    /// Identifier of the producing device, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Text matched against the configured trigger messages.
    pub message: String,
}

#[derive(Deserialize)]
struct EnvelopeFields {
    #[serde(default, rename = "timestamps", alias = "timestamp")]
    timestamp: Option<String>,
    payload: Payload,
}

/// A decoded message together with the document it was decoded from.
///
/// Serialising an envelope reproduces the original document rather than the
/// typed view, so an acknowledgement echo never gains fields the producer did
/// not send.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    document: Map<String, Value>,
    timestamp: Option<String>,
    payload: Payload,
}

impl Envelope {
    /// Builds a fresh envelope as a producer would send it.
    #[must_use]
    pub fn new(
        timestamp: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        let id = id.into();
        let message = message.into();
        let mut payload_document = Map::new();
        payload_document.insert(String::from("id"), Value::String(id.clone()));
        payload_document.insert(String::from("message"), Value::String(message.clone()));
        let payload = Payload {
            id: Some(id),
            message,
        };
        let mut document = Map::new();
        document.insert(String::from("timestamps"), Value::String(timestamp.clone()));
        document.insert(String::from("payload"), Value::Object(payload_document));
        Self {
            document,
            timestamp: Some(timestamp),
            payload,
        }
    }

    /// Interprets a non-empty JSON object as an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Malformed`] when `payload.message` is missing or a
    /// field has the wrong type.
    pub fn from_document(document: Map<String, Value>) -> Result<Self, WireError> {
        let fields: EnvelopeFields = serde_json::from_value(Value::Object(document.clone()))
            .map_err(WireError::from_json_error)?;
        Ok(Self {
            document,
            timestamp: fields.timestamp,
            payload: fields.payload,
        })
    }

    /// Producer timestamp, when supplied.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Typed payload view.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Convenience accessor for `payload.message`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.payload.message
    }

    /// Whether the message carries the termination sentinel.
    #[must_use]
    pub fn requests_exit(&self) -> bool {
        self.payload.message.contains(EXIT_SENTINEL)
    }
}

impl Serialize for Envelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document.serialize(serializer)
    }
}

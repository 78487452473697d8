//! Error types for rule loading.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::rule::PinId;

/// Errors surfaced while loading or cross-checking rule files.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule file could not be read.
    #[error("failed to read rule file '{path}': {source}")]
    Read {
        /// Path of the rule file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The rule file is not valid YAML.
    #[error("failed to parse rule file: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
    /// The rule file contains no rules.
    #[error("rule file contains no rules")]
    Empty,
    /// A rule is missing a required key or a value has the wrong type.
    #[error("invalid rule '{rule}': key '{key}' {reason}")]
    InvalidRule {
        /// Name of the offending rule.
        rule: String,
        /// Offending key.
        key: String,
        /// What is wrong with the key.
        reason: String,
    },
    /// One pin is configured both as an input and as an output.
    #[error("pin {pin} is used by output rule '{output_rule}' and input rule '{input_rule}'")]
    PinConflict {
        /// Pin claimed by both rule files.
        pin: PinId,
        /// Output rule driving the pin.
        output_rule: String,
        /// Input rule sampling the pin.
        input_rule: String,
    },
}

impl RuleError {
    /// Creates an invalid rule error.
    #[must_use]
    pub fn invalid_rule(
        rule: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing key error.
    #[must_use]
    pub fn missing_key(rule: impl Into<String>, key: impl Into<String>) -> Self {
        Self::invalid_rule(rule, key, "is required")
    }

    /// Returns the offending key for [`RuleError::InvalidRule`].
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidRule { key, .. } => Some(key),
            _ => None,
        }
    }
}

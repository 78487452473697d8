//! Loosely typed rule values and their coercions.

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::error::RuleError;

/// One value read from a rule entry before validation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Scalar {
    /// Coerces integers, integral floats and numeric strings.
    pub(crate) fn to_integer(&self, rule: &str, key: &str) -> Result<i64, RuleError> {
        match self {
            Self::Integer(value) => Ok(*value),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{value:.0}")
                    .parse()
                    .map_err(|_| RuleError::invalid_rule(rule, key, "is out of range"))
            }
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| RuleError::invalid_rule(rule, key, "must be an integer")),
            Self::Bool(_) | Self::Float(_) | Self::Other(_) => {
                Err(RuleError::invalid_rule(rule, key, "must be an integer"))
            }
        }
    }

    /// Coerces strings and numbers to text.
    pub(crate) fn to_text(&self, rule: &str, key: &str) -> Result<String, RuleError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Integer(value) => Ok(value.to_string()),
            Self::Float(value) => Ok(value.to_string()),
            Self::Bool(_) | Self::Other(_) => {
                Err(RuleError::invalid_rule(rule, key, "must be a string"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_coerce_to_integers() {
        let value = Scalar::Text(String::from(" 18 "));
        assert_eq!(value.to_integer("r", "input_pin").expect("coerce"), 18);
    }

    #[test]
    fn integral_floats_coerce_to_integers() {
        let value = Scalar::Float(7.0);
        assert_eq!(value.to_integer("r", "output_pin").expect("coerce"), 7);
    }

    #[test]
    fn fractional_floats_are_rejected() {
        let value = Scalar::Float(7.5);
        assert!(value.to_integer("r", "duration").is_err());
    }

    #[test]
    fn booleans_are_not_integers() {
        let error = Scalar::Bool(true)
            .to_integer("r", "duration")
            .expect_err("bool must be rejected");
        assert_eq!(error.key(), Some("duration"));
    }

    #[test]
    fn numbers_coerce_to_text() {
        assert_eq!(Scalar::Integer(1).to_text("r", "keystroke").expect("text"), "1");
    }
}

//! Rule file loading and validation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::time::Duration;

use camino::Utf8Path;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use tracing::warn;

use crate::error::RuleError;
use crate::rule::{
    ActionMode, DispatchRule, EventClass, InputRule, MAX_ACTION_DURATION, MatchMode, PinId,
};
use crate::scalar::Scalar;

const RULES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::set");

const OUTPUT_PIN: &str = "output_pin";
const EVENT: &str = "event";
const MODE: &str = "mode";
const TRIGGER: &str = "trigger_msg";
const DURATION: &str = "duration";
const MATCH: &str = "match";
const INPUT_PIN: &str = "input_pin";
const KEYSTROKE: &str = "keystroke";

/// Rule entry as read from YAML, before validation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Fields(BTreeMap<String, Scalar>),
    Other(IgnoredAny),
}

impl RawEntry {
    fn field(&self, rule: &str, key: &str) -> Result<&Scalar, RuleError> {
        match self {
            Self::Fields(fields) => fields
                .get(key)
                .ok_or_else(|| RuleError::missing_key(rule, key)),
            Self::Other(_) => Err(RuleError::missing_key(rule, key)),
        }
    }

    fn optional(&self, key: &str) -> Option<&Scalar> {
        match self {
            Self::Fields(fields) => fields.get(key),
            Self::Other(_) => None,
        }
    }
}

/// Top-level mapping of rule name to entry, in file order.
struct RuleDocument(Vec<(String, RawEntry)>);

impl<'de> Deserialize<'de> for RuleDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RuleDocument;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mapping of rule names to rule entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, entry)) = access.next_entry::<String, RawEntry>()? {
                    if entries.iter().any(|(existing, _)| existing == &name) {
                        return Err(de::Error::custom(format!("duplicate rule name '{name}'")));
                    }
                    entries.push((name, entry));
                }
                Ok(RuleDocument(entries))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

fn parse_document(text: &str) -> Result<Vec<(String, RawEntry)>, RuleError> {
    if text.trim().is_empty() {
        return Err(RuleError::Empty);
    }
    let document: Option<RuleDocument> =
        serde_saphyr::from_str(text).map_err(|error| RuleError::Parse {
            message: error.to_string(),
        })?;
    match document {
        Some(RuleDocument(entries)) if !entries.is_empty() => Ok(entries),
        _ => Err(RuleError::Empty),
    }
}

fn read_rule_file(path: &Utf8Path) -> Result<String, RuleError> {
    fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn pin_field(entry: &RawEntry, rule: &str, key: &str) -> Result<PinId, RuleError> {
    let value = entry.field(rule, key)?.to_integer(rule, key)?;
    u32::try_from(value)
        .map(PinId::new)
        .map_err(|_| RuleError::invalid_rule(rule, key, "must be a non-negative pin number"))
}

fn text_field(entry: &RawEntry, rule: &str, key: &str) -> Result<String, RuleError> {
    entry.field(rule, key)?.to_text(rule, key)
}

fn non_empty_text_field(entry: &RawEntry, rule: &str, key: &str) -> Result<String, RuleError> {
    let text = text_field(entry, rule, key)?;
    if text.is_empty() {
        return Err(RuleError::invalid_rule(rule, key, "must not be empty"));
    }
    Ok(text)
}

fn duration_field(entry: &RawEntry, rule: &str) -> Result<Duration, RuleError> {
    let raw = entry.field(rule, DURATION)?.to_integer(rule, DURATION)?;
    u64::try_from(raw)
        .map(Duration::from_secs)
        .map_err(|_| RuleError::invalid_rule(rule, DURATION, "must not be negative"))
}

fn parse_with<T>(entry: &RawEntry, rule: &str, key: &str, expected: &str) -> Result<T, RuleError>
where
    T: std::str::FromStr,
{
    text_field(entry, rule, key)?
        .trim()
        .parse()
        .map_err(|_| RuleError::invalid_rule(rule, key, format!("must be one of {expected}")))
}

fn dispatch_rule(name: &str, entry: &RawEntry) -> Result<DispatchRule, RuleError> {
    let pin = pin_field(entry, name, OUTPUT_PIN)?;
    let event: EventClass = parse_with(entry, name, EVENT, "LED")?;
    let mode: ActionMode = parse_with(
        entry,
        name,
        MODE,
        "constant_on, constant_off, single_pulse, fast_blink, slow_blink",
    )?;
    let trigger = non_empty_text_field(entry, name, TRIGGER)?;
    let duration = duration_field(entry, name)?;
    let match_mode = match entry.optional(MATCH) {
        Some(_) => parse_with(entry, name, MATCH, "contains, exact")?,
        None => MatchMode::default(),
    };

    let rule = DispatchRule::new(name, trigger, pin, event, mode, duration)
        .with_match_mode(match_mode);
    if rule.was_clamped() {
        warn!(
            target: RULES_TARGET,
            rule = name,
            configured_secs = rule.configured_duration().as_secs(),
            effective_secs = MAX_ACTION_DURATION.as_secs(),
            "action duration clamped"
        );
    }
    if rule.match_mode() == MatchMode::Contains && rule.trigger().chars().count() == 1 {
        warn!(
            target: RULES_TARGET,
            rule = name,
            trigger = rule.trigger(),
            "single-character trigger matches any message containing it"
        );
    }
    Ok(rule)
}

fn input_rule(name: &str, entry: &RawEntry) -> Result<InputRule, RuleError> {
    let pin = pin_field(entry, name, INPUT_PIN)?;
    let keystroke = non_empty_text_field(entry, name, KEYSTROKE)?;
    Ok(InputRule::new(name, pin, keystroke))
}

/// Ordered, validated output rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<DispatchRule>,
}

impl RuleSet {
    /// Builds a rule set from already validated rules.
    #[must_use]
    pub const fn new(rules: Vec<DispatchRule>) -> Self {
        Self { rules }
    }

    /// Reads and validates an output rule file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Read`] when the file cannot be read, and any error
    /// of [`RuleSet::from_yaml`].
    pub fn load(path: &Utf8Path) -> Result<Self, RuleError> {
        Self::from_yaml(&read_rule_file(path)?)
    }

    /// Validates an output rule document.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Parse`] for invalid YAML, [`RuleError::Empty`]
    /// when the document holds no rules, and [`RuleError::InvalidRule`] for
    /// the first rule with a missing or mistyped key.
    pub fn from_yaml(text: &str) -> Result<Self, RuleError> {
        let rules = parse_document(text)?
            .iter()
            .map(|(name, entry)| dispatch_rule(name, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Rules whose trigger fires for `message`, in file order.
    pub fn matches<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a DispatchRule> + 'a {
        self.rules.iter().filter(move |rule| rule.matches(message))
    }

    /// Distinct output pins, ascending.
    #[must_use]
    pub fn output_pins(&self) -> BTreeSet<PinId> {
        self.rules.iter().map(DispatchRule::pin).collect()
    }

    /// All rules in file order.
    pub fn iter(&self) -> impl Iterator<Item = &DispatchRule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Ordered, validated input rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRuleSet {
    rules: Vec<InputRule>,
}

impl InputRuleSet {
    /// Builds an input rule set from already validated rules.
    #[must_use]
    pub const fn new(rules: Vec<InputRule>) -> Self {
        Self { rules }
    }

    /// Reads and validates an input rule file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Read`] when the file cannot be read, and any error
    /// of [`InputRuleSet::from_yaml`].
    pub fn load(path: &Utf8Path) -> Result<Self, RuleError> {
        Self::from_yaml(&read_rule_file(path)?)
    }

    /// Validates an input rule document.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Parse`] for invalid YAML, [`RuleError::Empty`]
    /// when the document holds no rules, and [`RuleError::InvalidRule`] for
    /// the first rule with a missing or mistyped key.
    pub fn from_yaml(text: &str) -> Result<Self, RuleError> {
        let rules = parse_document(text)?
            .iter()
            .map(|(name, entry)| input_rule(name, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Distinct input pins, ascending.
    #[must_use]
    pub fn input_pins(&self) -> BTreeSet<PinId> {
        self.rules.iter().map(InputRule::pin).collect()
    }

    /// All rules in file order.
    pub fn iter(&self) -> impl Iterator<Item = &InputRule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rejects rule files that claim one pin as both input and output.
///
/// # Errors
///
/// Returns [`RuleError::PinConflict`] naming the first output rule, in file
/// order, whose pin is also sampled by an input rule.
pub fn ensure_disjoint(outputs: &RuleSet, inputs: &InputRuleSet) -> Result<(), RuleError> {
    for output in outputs.iter() {
        if let Some(input) = inputs.iter().find(|input| input.pin() == output.pin()) {
            return Err(RuleError::PinConflict {
                pin: output.pin(),
                output_rule: output.name().to_owned(),
                input_rule: input.name().to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;

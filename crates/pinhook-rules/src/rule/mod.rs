//! Individual dispatch and input rules.

use std::fmt;
use std::time::Duration;

use strum::{Display, EnumString};

/// Ceiling applied to every action duration, whatever the rule file says.
pub const MAX_ACTION_DURATION: Duration = Duration::from_secs(60);

/// Kernel GPIO line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(u32);

impl PinId {
    /// Wraps a GPIO line number.
    #[must_use]
    pub const fn new(line: u32) -> Self {
        Self(line)
    }

    /// Raw GPIO line number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Pin action performed when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionMode {
    /// Drive the pin high and return.
    ConstantOn,
    /// Drive the pin low and return.
    ConstantOff,
    /// Drive the pin high for the rule duration, then low.
    #[strum(to_string = "single_pulse", serialize = "simple_blink")]
    SinglePulse,
    /// Toggle the pin every 100 ms for the rule duration.
    FastBlink,
    /// Toggle the pin every 300 ms for the rule duration.
    SlowBlink,
}

impl ActionMode {
    /// Half of the blink period, for the blinking modes.
    #[must_use]
    pub const fn half_period(self) -> Option<Duration> {
        match self {
            Self::FastBlink => Some(Duration::from_millis(100)),
            Self::SlowBlink => Some(Duration::from_millis(300)),
            Self::ConstantOn | Self::ConstantOff | Self::SinglePulse => None,
        }
    }

}

/// Kind of device a dispatch rule drives.
///
/// Only LEDs are driven so far; any other class in a rule file is rejected
/// when the file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum EventClass {
    /// A light driven through the action modes.
    #[strum(to_string = "LED")]
    Led,
}

/// How a rule's trigger text is compared with inbound messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MatchMode {
    /// The trigger appears anywhere in the message.
    #[default]
    Contains,
    /// The trigger equals the whole message.
    Exact,
}

impl MatchMode {
    /// Applies the comparison.
    #[must_use]
    pub fn matches(self, trigger: &str, message: &str) -> bool {
        match self {
            Self::Contains => message.contains(trigger),
            Self::Exact => message == trigger,
        }
    }
}

/// Maps trigger text to an action on one output pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRule {
    name: String,
    trigger: String,
    pin: PinId,
    event: EventClass,
    mode: ActionMode,
    duration: Duration,
    configured_duration: Duration,
    match_mode: MatchMode,
}

impl DispatchRule {
    /// Builds a rule, clamping `duration` to [`MAX_ACTION_DURATION`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        trigger: impl Into<String>,
        pin: PinId,
        event: EventClass,
        mode: ActionMode,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            pin,
            event,
            mode,
            duration: duration.min(MAX_ACTION_DURATION),
            configured_duration: duration,
            match_mode: MatchMode::Contains,
        }
    }

    /// Replaces the comparison used for the trigger.
    #[must_use]
    pub const fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Rule name from the rule file.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trigger text.
    #[must_use]
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Output pin driven by the rule.
    #[must_use]
    pub const fn pin(&self) -> PinId {
        self.pin
    }

    /// Device class the rule drives.
    #[must_use]
    pub const fn event(&self) -> EventClass {
        self.event
    }

    /// Action performed when the rule fires.
    #[must_use]
    pub const fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Effective duration after clamping.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Duration as written in the rule file.
    #[must_use]
    pub const fn configured_duration(&self) -> Duration {
        self.configured_duration
    }

    /// Whether the configured duration exceeded the ceiling.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.configured_duration > self.duration
    }

    /// Trigger comparison mode.
    #[must_use]
    pub const fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Whether the rule fires for `message`.
    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        self.match_mode.matches(&self.trigger, message)
    }
}

/// Maps one input pin to a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRule {
    name: String,
    pin: PinId,
    keystroke: String,
}

impl InputRule {
    /// Builds an input rule.
    #[must_use]
    pub fn new(name: impl Into<String>, pin: PinId, keystroke: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pin,
            keystroke: keystroke.into(),
        }
    }

    /// Rule name from the rule file.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sampled input pin.
    #[must_use]
    pub const fn pin(&self) -> PinId {
        self.pin
    }

    /// Keystroke emitted when the pin goes high.
    #[must_use]
    pub fn keystroke(&self) -> &str {
        &self.keystroke
    }
}

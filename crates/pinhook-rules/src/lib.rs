//! Validated rule sets for the pinhook dispatcher and poller.
//!
//! Two YAML documents drive the engine. The output rule file maps trigger
//! text found in inbound messages to pin actions:
//!
//! ```yaml
//! status_led:
//!   output_pin: 7
//!   event: LED
//!   mode: fast_blink
//!   trigger_msg: sys_ready
//!   duration: 5
//! ```
//!
//! The input rule file maps input pins to keystrokes:
//!
//! ```yaml
//! button_b:
//!   input_pin: 18
//!   keystroke: b
//! ```
//!
//! Loading is all-or-nothing: any missing or mistyped key fails the whole
//! file with [`RuleError::InvalidRule`], so a partially loaded rule set can
//! never leave pins unconfigured.

mod error;
mod rule;
mod scalar;
mod set;

pub use error::RuleError;
pub use rule::{
    ActionMode, DispatchRule, EventClass, InputRule, MAX_ACTION_DURATION, MatchMode, PinId,
};
pub use set::{InputRuleSet, RuleSet, ensure_disjoint};

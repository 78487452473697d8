//! Unit tests for rule file loading.

use std::io::Write;
use std::time::Duration;

use camino::Utf8Path;
use rstest::rstest;
use tempfile::NamedTempFile;

use super::*;

const TWO_LEDS: &str = "\
ready_led:
  output_pin: 7
  event: LED
  mode: fast_blink
  trigger_msg: ready
  duration: 5
button_led:
  output_pin: 8
  event: LED
  mode: constant_on
  trigger_msg: b
  duration: 0
";

const BUTTONS: &str = "\
button_a:
  input_pin: 17
  keystroke: a
button_b:
  input_pin: \"18\"
  keystroke: b
";

fn names<'a>(rules: impl Iterator<Item = &'a DispatchRule>) -> Vec<&'a str> {
    rules.map(DispatchRule::name).collect()
}

#[test]
fn loads_rules_in_file_order() {
    let rules = RuleSet::from_yaml(TWO_LEDS).expect("rules should load");
    assert_eq!(names(rules.iter()), vec!["ready_led", "button_led"]);
    let first = rules.iter().next().expect("first rule");
    assert_eq!(first.pin(), PinId::new(7));
    assert_eq!(first.mode(), ActionMode::FastBlink);
    assert_eq!(first.event(), EventClass::Led);
    assert_eq!(first.duration(), Duration::from_secs(5));
}

#[test]
fn one_message_can_fire_several_rules() {
    let rules = RuleSet::from_yaml(TWO_LEDS).expect("rules should load");
    assert_eq!(
        names(rules.matches("sys_ready_button_b")),
        vec!["ready_led", "button_led"]
    );
    assert_eq!(rules.matches("idle").count(), 0);
}

#[test]
fn exact_match_mode_is_read_from_the_rule() {
    let yaml = "\
strict:
  output_pin: 3
  event: LED
  mode: constant_off
  trigger_msg: halt
  duration: 0
  match: exact
";
    let rules = RuleSet::from_yaml(yaml).expect("rules should load");
    assert_eq!(rules.matches("halt").count(), 1);
    assert_eq!(rules.matches("halt now").count(), 0);
}

#[test]
fn legacy_pulse_mode_is_accepted() {
    let yaml = "\
pulse:
  output_pin: 4
  event: LED
  mode: simple_blink
  trigger_msg: ping
  duration: 1
";
    let rules = RuleSet::from_yaml(yaml).expect("rules should load");
    let rule = rules.iter().next().expect("rule");
    assert_eq!(rule.mode(), ActionMode::SinglePulse);
}

#[test]
fn long_durations_are_clamped() {
    let yaml = "\
long:
  output_pin: 4
  event: LED
  mode: slow_blink
  trigger_msg: ping
  duration: 90
";
    let rules = RuleSet::from_yaml(yaml).expect("rules should load");
    let rule = rules.iter().next().expect("rule");
    assert_eq!(rule.duration(), MAX_ACTION_DURATION);
    assert!(rule.was_clamped());
}

#[rstest]
#[case::missing_pin("output_pin")]
#[case::missing_event("event")]
#[case::missing_mode("mode")]
#[case::missing_trigger("trigger_msg")]
#[case::missing_duration("duration")]
fn missing_keys_fail_the_whole_file(#[case] omitted: &str) {
    let fields = [
        ("output_pin", "7"),
        ("event", "LED"),
        ("mode", "constant_on"),
        ("trigger_msg", "go"),
        ("duration", "1"),
    ];
    let mut yaml = String::from("good:\n  output_pin: 1\n  event: LED\n  mode: constant_on\n  trigger_msg: x\n  duration: 1\nbad:\n");
    for (key, value) in fields.iter().filter(|(key, _)| *key != omitted) {
        yaml.push_str(&format!("  {key}: {value}\n"));
    }

    let error = RuleSet::from_yaml(&yaml).expect_err("missing key must fail");
    assert!(
        matches!(&error, RuleError::InvalidRule { rule, key, .. } if rule == "bad" && key == omitted),
        "unexpected error: {error}"
    );
}

#[rstest]
#[case::negative_pin("output_pin: -1", "output_pin")]
#[case::text_pin("output_pin: seven", "output_pin")]
#[case::negative_duration("duration: -5", "duration")]
#[case::unknown_event("event: MOTOR", "event")]
#[case::unknown_mode("mode: strobe", "mode")]
#[case::unknown_match("match: fuzzy", "match")]
#[case::empty_trigger("trigger_msg: \"\"", "trigger_msg")]
fn mistyped_values_are_rejected(#[case] replacement: &str, #[case] key: &str) {
    let base = [
        "output_pin: 7",
        "event: LED",
        "mode: constant_on",
        "trigger_msg: go",
        "duration: 1",
    ];
    let mut yaml = String::from("rule:\n");
    for line in base.iter().filter(|line| !line.starts_with(key)) {
        yaml.push_str(&format!("  {line}\n"));
    }
    yaml.push_str(&format!("  {replacement}\n"));

    let error = RuleSet::from_yaml(&yaml).expect_err("mistyped value must fail");
    assert_eq!(error.key(), Some(key), "unexpected error: {error}");
}

#[rstest]
#[case::blank("")]
#[case::whitespace("   \n")]
fn empty_documents_are_rejected(#[case] yaml: &str) {
    assert!(matches!(RuleSet::from_yaml(yaml), Err(RuleError::Empty)));
}

#[test]
fn invalid_yaml_is_a_parse_error() {
    let result = RuleSet::from_yaml("rule: [unterminated");
    assert!(matches!(result, Err(RuleError::Parse { .. })));
}

#[test]
fn output_pins_are_distinct() {
    let yaml = format!(
        "{TWO_LEDS}again:\n  output_pin: 7\n  event: LED\n  mode: constant_off\n  trigger_msg: stop\n  duration: 0\n"
    );
    let rules = RuleSet::from_yaml(&yaml).expect("rules should load");
    let pins: Vec<_> = rules.output_pins().into_iter().collect();
    assert_eq!(pins, vec![PinId::new(7), PinId::new(8)]);
}

#[test]
fn input_rules_coerce_numeric_strings() {
    let rules = InputRuleSet::from_yaml(BUTTONS).expect("input rules should load");
    let pins: Vec<_> = rules.input_pins().into_iter().collect();
    assert_eq!(pins, vec![PinId::new(17), PinId::new(18)]);
    let keystrokes: Vec<_> = rules.iter().map(InputRule::keystroke).collect();
    assert_eq!(keystrokes, vec!["a", "b"]);
}

#[test]
fn input_rule_without_pin_is_rejected() {
    let error = InputRuleSet::from_yaml("button:\n  keystroke: a\n").expect_err("must fail");
    assert_eq!(error.key(), Some("input_pin"));
}

#[test]
fn load_reads_from_disk() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(TWO_LEDS.as_bytes()).expect("write rules");
    let path = Utf8Path::from_path(file.path()).expect("utf8 path");
    let rules = RuleSet::load(path).expect("rules should load");
    assert_eq!(rules.len(), 2);
}

#[test]
fn load_reports_missing_file() {
    let result = RuleSet::load(Utf8Path::new("/nonexistent/pinhook/rules.yaml"));
    assert!(matches!(result, Err(RuleError::Read { .. })));
}

#[test]
fn shared_pins_are_a_conflict() {
    let outputs = RuleSet::from_yaml(TWO_LEDS).expect("rules should load");
    let inputs = InputRuleSet::from_yaml("button:\n  input_pin: 8\n  keystroke: b\n")
        .expect("input rules should load");
    let error = ensure_disjoint(&outputs, &inputs).expect_err("conflict expected");
    assert!(matches!(
        error,
        RuleError::PinConflict { pin, ref output_rule, ref input_rule }
            if pin == PinId::new(8) && output_rule == "button_led" && input_rule == "button"
    ));
}

#[test]
fn disjoint_pins_pass() {
    let outputs = RuleSet::from_yaml(TWO_LEDS).expect("rules should load");
    let inputs = InputRuleSet::from_yaml(BUTTONS).expect("input rules should load");
    assert!(ensure_disjoint(&outputs, &inputs).is_ok());
}

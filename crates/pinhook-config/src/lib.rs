//! Shared runtime configuration for the pinhook binaries.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a TOML
//! file selected with `--config-path` or `PINHOOK_CONFIG_PATH`, then
//! `PINHOOK_*` environment variables, then command-line flags. Rule files are
//! referenced by path only; their contents are validated by `pinhook-rules`.

mod defaults;
mod logging;
mod pipes;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_GPIO_ROOT, DEFAULT_KEYSTROKE_PROGRAM, DEFAULT_KEYSTROKE_SUFFIX, DEFAULT_LOG_FILTER,
    DEFAULT_POLL_INTERVAL_MS, default_gpio_root, default_keystroke_program,
    default_keystroke_suffix, default_log_filter, default_log_filter_string, default_log_format,
    default_pipe_dir, default_poll_interval_ms,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use pipes::{INBOUND_PIPE_NAME, OUTBOUND_PIPE_NAME, PipeEndpoint, PipePreparationError};

/// Resolved configuration shared by the dispatcher, the poller and the producer CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PINHOOK")]
pub struct Config {
    /// Directory holding `pipe.in` and `pipe.out`.
    #[serde(default = "default_pipe_dir")]
    pub pipe_dir: Utf8PathBuf,
    /// YAML file mapping trigger messages to output pin actions.
    #[serde(default)]
    pub output_rules: Option<Utf8PathBuf>,
    /// YAML file mapping input pins to keystrokes.
    #[serde(default)]
    pub input_rules: Option<Utf8PathBuf>,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format of log events.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Optional log file; logs go to stderr when unset.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
    /// Root of the sysfs GPIO interface.
    #[serde(default = "default_gpio_root")]
    pub gpio_root: Utf8PathBuf,
    /// Program used to synthesise keystrokes.
    #[serde(default = "default_keystroke_program")]
    pub keystroke_program: String,
    /// Text appended to every keystroke name; empty to send the key alone.
    #[serde(default = "default_keystroke_suffix")]
    pub keystroke_suffix: String,
    /// Interval between two samples of the input pins, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipe_dir: default_pipe_dir(),
            output_rules: None,
            input_rules: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
            gpio_root: default_gpio_root(),
            keystroke_program: default_keystroke_program(),
            keystroke_suffix: default_keystroke_suffix(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Pipe pair used by the dispatcher and producers.
    #[must_use]
    pub fn pipe_endpoint(&self) -> PipeEndpoint {
        PipeEndpoint::new(self.pipe_dir.clone())
    }

    /// Output rule file, when configured.
    #[must_use]
    pub fn output_rules(&self) -> Option<&Utf8Path> {
        self.output_rules.as_deref()
    }

    /// Input rule file, when configured.
    #[must_use]
    pub fn input_rules(&self) -> Option<&Utf8Path> {
        self.input_rules.as_deref()
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Log file destination, when configured.
    #[must_use]
    pub fn log_file(&self) -> Option<&Utf8Path> {
        self.log_file.as_deref()
    }

    /// Root of the sysfs GPIO interface.
    #[must_use]
    pub fn gpio_root(&self) -> &Utf8Path {
        self.gpio_root.as_path()
    }

    /// Program used to synthesise keystrokes.
    #[must_use]
    pub fn keystroke_program(&self) -> &str {
        &self.keystroke_program
    }

    /// Text appended to every keystroke name.
    #[must_use]
    pub fn keystroke_suffix(&self) -> &str {
        &self.keystroke_suffix
    }

    /// Interval between two samples of the input pins.
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

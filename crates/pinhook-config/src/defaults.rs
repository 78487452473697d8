use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Sysfs directory exposing the GPIO export interface.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// Program invoked to synthesise keystrokes.
pub const DEFAULT_KEYSTROKE_PROGRAM: &str = "xdotool";

/// Text appended to every keystroke; `+Return` presses Enter after the key.
pub const DEFAULT_KEYSTROKE_SUFFIX: &str = "+Return";

/// Interval between two samples of the input pins.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default sysfs GPIO root.
pub fn default_gpio_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_GPIO_ROOT)
}

/// Owned keystroke program name used by serde defaults.
pub fn default_keystroke_program() -> String {
    DEFAULT_KEYSTROKE_PROGRAM.to_string()
}

/// Owned keystroke suffix used by serde defaults.
pub fn default_keystroke_suffix() -> String {
    DEFAULT_KEYSTROKE_SUFFIX.to_string()
}

/// Default poll period in milliseconds.
pub fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Computes the default directory holding the dispatcher's named pipes.
///
/// The per-user runtime directory is preferred. Without one the pipes live in
/// the temporary directory, namespaced by effective user id so two users on
/// one host never share a rendezvous point.
pub fn default_pipe_dir() -> Utf8PathBuf {
    default_pipe_dir_inner()
}

#[cfg(unix)]
fn default_pipe_dir_inner() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("pinhook");
    if apply_namespace {
        base.push(user_namespace());
    }
    base
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_pipe_dir_inner() -> Utf8PathBuf {
    let mut base = fallback_base_directory();
    base.push("pinhook");
    base
}

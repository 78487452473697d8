use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use camino::Utf8PathBuf;
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use pinhook_config::{
    Config, DEFAULT_GPIO_ROOT, default_log_filter, default_log_format, default_pipe_dir,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("pinhook-dispatch")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_lock: env_lock,
        }
    }

    fn write_config(&self, pipe_dir: &str) {
        let path = self.temp_dir.path().join("pinhook.toml");
        let toml = format!("pipe_dir = \"{pipe_dir}\"\npoll_interval_ms = 250\n");

        if let Err(error) = fs::write(&path, toml) {
            panic!("failed to write configuration: {error}");
        }

        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024. The harness holds
        // the env mutex and restores overrides in `Drop`.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_string(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => {
                *self.loaded.borrow_mut() = Some(config);
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }

    fn loaded_config(&self) -> Config {
        self.load();

        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }

        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the pipe directory to \"{dir}\"")]
fn given_configuration_file(harness: &Harness, dir: String) {
    harness.write_config(dir.trim_matches('"'));
}

#[given("the environment overrides the pipe directory to \"{dir}\"")]
fn given_environment_override(harness: &Harness, dir: String) {
    harness.set_env("PINHOOK_PIPE_DIR", dir.trim_matches('"'));
}

#[when("the CLI sets the pipe directory to \"{dir}\"")]
fn when_cli_override(harness: &Harness, dir: String) {
    harness.push_cli_arg("--pipe-dir");
    harness.push_cli_arg(OsString::from(dir.trim_matches('"')));
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the pipe directory to \"{dir}\"")]
fn then_resolved_pipe_dir(harness: &Harness, dir: String) {
    let config = harness.loaded_config();
    assert_eq!(config.pipe_dir, Utf8PathBuf::from(dir.trim_matches('"')));
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();

    assert_eq!(config.pipe_dir, default_pipe_dir());
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.gpio_root().as_str(), DEFAULT_GPIO_ROOT);
    assert!(
        config.output_rules().is_none(),
        "expected no output rule file by default"
    );
}

#[scenario(path = "tests/features/configuration_precedence.feature")]
fn configuration_precedence(#[from(harness)] harness: Harness) {
    let _ = harness;
}

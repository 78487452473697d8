//! Configuration loaders backed by temporary directories.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use pinhook_config::{Config, LogFormat, PipeEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that writes rule files into a private temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
    config: Config,
}

impl TestConfigLoader {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8");
        let config = Config {
            pipe_dir: root.join("pipes"),
            log_format: LogFormat::Compact,
            log_filter: String::from("warn"),
            gpio_root: root.join("gpio"),
            keystroke_program: String::from("true"),
            ..Config::default()
        };
        Self { dir, config }
    }

    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root().join(name);
        fs::write(&path, contents).expect("failed to write rule file");
        path
    }

    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8")
    }

    pub fn set_output_rules(&mut self, yaml: &str) {
        self.config.output_rules = Some(self.write("outputs.yaml", yaml));
    }

    pub fn set_input_rules(&mut self, yaml: &str) {
        self.config.input_rules = Some(self.write("inputs.yaml", yaml));
    }

    pub fn block_pipe_dir(&mut self) {
        let blocker = self.write("not-a-directory", "");
        self.config.pipe_dir = blocker.join("pipes");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipe_endpoint(&self) -> PipeEndpoint {
        self.config.pipe_endpoint()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by pointing at a malformed configuration file.
pub struct FailingConfigLoader {
    dir: TempDir,
}

impl FailingConfigLoader {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        fs::write(
            dir.path().join("pinhook.toml"),
            "poll_interval_ms = not_a_number\n",
        )
        .expect("failed to write malformed configuration");
        Self { dir }
    }
}

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("pinhookd"),
            OsString::from("--config-path"),
            self.dir.path().join("pinhook.toml").into_os_string(),
        ];
        Config::load_from_iter(args)
    }
}

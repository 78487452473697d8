//! Keystroke synthesis.

use std::io;
use std::process::{Child, Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use super::HARDWARE_TARGET;

/// Errors raised while emitting a keystroke.
#[derive(Debug, Error)]
pub enum KeystrokeError {
    /// The keystroke program could not be started.
    #[error("failed to run '{program}' for keystroke '{keystroke}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Keystroke being emitted.
        keystroke: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Emits synthetic keystrokes.
pub trait KeystrokeEmitter {
    /// Emits the named keystroke.
    fn emit(&mut self, keystroke: &str) -> Result<(), KeystrokeError>;
}

impl<K> KeystrokeEmitter for &mut K
where
    K: KeystrokeEmitter + ?Sized,
{
    fn emit(&mut self, keystroke: &str) -> Result<(), KeystrokeError> {
        (**self).emit(keystroke)
    }
}

/// Runs `<program> key <keystroke><suffix>` without waiting for it.
///
/// With the default `xdotool` program and a `+Return` suffix, keystroke `b`
/// types `b` followed by Enter. Finished children are reaped on the next
/// emission and when the emitter is dropped.
#[derive(Debug)]
pub struct CommandKeystrokeEmitter {
    program: String,
    suffix: String,
    children: Vec<Child>,
}

impl CommandKeystrokeEmitter {
    /// Builds an emitter around `program` that sends keystrokes unchanged.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            suffix: String::new(),
            children: Vec::new(),
        }
    }

    /// Appends `suffix` to every keystroke name before it is sent.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    fn key_argument(&self, keystroke: &str) -> String {
        format!("{keystroke}{}", self.suffix)
    }

    /// Number of spawned children not yet reaped.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.children.len()
    }

    /// Collects finished children, keeping the ones still running.
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!(
                        target: HARDWARE_TARGET,
                        pid = child.id(),
                        %status,
                        "keystroke program exited unsuccessfully"
                    );
                }
                false
            }
            Ok(None) => true,
            Err(error) => {
                warn!(
                    target: HARDWARE_TARGET,
                    pid = child.id(),
                    error = %error,
                    "failed to poll keystroke program"
                );
                false
            }
        });
    }
}

impl KeystrokeEmitter for CommandKeystrokeEmitter {
    fn emit(&mut self, keystroke: &str) -> Result<(), KeystrokeError> {
        self.reap();
        let child = Command::new(&self.program)
            .arg("key")
            .arg(self.key_argument(keystroke))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| KeystrokeError::Spawn {
                program: self.program.clone(),
                keystroke: keystroke.to_owned(),
                source,
            })?;
        debug!(
            target: HARDWARE_TARGET,
            pid = child.id(),
            keystroke,
            "keystroke program started"
        );
        self.children.push(child);
        Ok(())
    }
}

impl Drop for CommandKeystrokeEmitter {
    fn drop(&mut self) {
        self.reap();
    }
}

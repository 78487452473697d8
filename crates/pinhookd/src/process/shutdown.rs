use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::errno::Errno;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info, warn};

use pinhook_config::PipeEndpoint;

use super::PROCESS_TARGET;
use super::flag::ShutdownFlag;
use crate::transport::wake_reader;

/// Delay between attempts to wake a dispatcher that is not reading yet.
const WAKE_RETRY: Duration = Duration::from_millis(50);

/// Closure that makes a blocked [`ShutdownSignal::wait`] return.
pub type ShutdownCloser = Box<dyn FnOnce() + Send>;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + 'static {
    /// Blocks until shutdown is requested or the listener is closed.
    ///
    /// Returns `true` when shutdown was requested.
    fn wait(&mut self) -> bool;

    /// Returns a closer that releases a pending or future [`Self::wait`].
    fn closer(&self) -> ShutdownCloser;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The watcher thread could not be started.
    #[error("failed to start shutdown watcher: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
pub struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    /// Installs handlers for `SIGTERM`, `SIGINT`, `SIGQUIT` and `SIGHUP`.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when the handlers cannot be
    /// registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&mut self) -> bool {
        match self.signals.forever().next() {
            Some(signal) => {
                info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                true
            }
            None => false,
        }
    }

    fn closer(&self) -> ShutdownCloser {
        let handle = self.signals.handle();
        Box::new(move || handle.close())
    }
}

/// Background thread turning a [`ShutdownSignal`] into a raised
/// [`ShutdownFlag`].
///
/// When an endpoint is attached, the watcher also wakes a reader blocked on
/// the inbound pipe so the loop observes the flag promptly. A reader that is
/// not attached yet is retried until the watcher is stopped.
pub(crate) struct ShutdownWatcher {
    closer: ShutdownCloser,
    stopped: ShutdownFlag,
    thread: JoinHandle<()>,
}

impl ShutdownWatcher {
    pub(crate) fn spawn<S>(
        mut signal: S,
        flag: ShutdownFlag,
        endpoint: Option<PipeEndpoint>,
    ) -> Result<Self, ShutdownError>
    where
        S: ShutdownSignal,
    {
        let closer = signal.closer();
        let stopped = ShutdownFlag::new();
        let watcher_stopped = stopped.clone();
        let thread = thread::Builder::new()
            .name(String::from("pinhook-shutdown"))
            .spawn(move || {
                if !signal.wait() {
                    return;
                }
                flag.trigger();
                if let Some(pipes) = endpoint {
                    wake_until_stopped(&pipes, &watcher_stopped);
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(Self {
            closer,
            stopped,
            thread,
        })
    }

    /// Releases the listener and waits for the thread to finish.
    pub(crate) fn stop(self) {
        self.stopped.trigger();
        (self.closer)();
        if self.thread.join().is_err() {
            warn!(target: PROCESS_TARGET, "shutdown watcher panicked");
        }
    }
}

fn wake_until_stopped(endpoint: &PipeEndpoint, stopped: &ShutdownFlag) {
    while !stopped.is_set() {
        match wake_reader(endpoint) {
            Ok(()) => return,
            Err(error) if reader_pending(&error) => thread::sleep(WAKE_RETRY),
            Err(error) => {
                debug!(
                    target: PROCESS_TARGET,
                    %error,
                    "could not wake the dispatcher"
                );
                return;
            }
        }
    }
}

fn reader_pending(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::NotFound || error.raw_os_error() == Some(Errno::ENXIO as i32)
}

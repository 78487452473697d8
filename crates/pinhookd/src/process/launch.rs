//! Supervises engine launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use pinhook_config::Config;

use crate::actions::{Clock, SystemClock};
use crate::bootstrap::{ConfigLoader, Role, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{DispatchLoop, DispatchSummary};
use crate::hardware::{CommandKeystrokeEmitter, KeystrokeEmitter, PinDriver, SysfsPinDriver};
use crate::poll::{PollDispatcher, PollSummary};
use crate::reporter::{ActivityReporter, StructuredActivityReporter};
use crate::transport::NamedPipeChannel;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::flag::ShutdownFlag;
use super::shutdown::{ShutdownSignal, ShutdownWatcher, SystemShutdownSignal};

/// Builds the capability adapters once configuration is known.
pub(crate) trait Hardware {
    type Pins: PinDriver;
    type Keys: KeystrokeEmitter;
    type Clock: Clock;

    fn pins(&self, config: &Config) -> Self::Pins;
    fn keys(&self, config: &Config) -> Self::Keys;
    fn clock(&self) -> Self::Clock;
}

/// Production adapters: sysfs GPIO, a spawned keystroke program and the wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemHardware;

impl Hardware for SystemHardware {
    type Pins = SysfsPinDriver;
    type Keys = CommandKeystrokeEmitter;
    type Clock = SystemClock;

    fn pins(&self, config: &Config) -> Self::Pins {
        SysfsPinDriver::new(config.gpio_root())
    }

    fn keys(&self, config: &Config) -> Self::Keys {
        CommandKeystrokeEmitter::new(config.keystroke_program())
            .with_suffix(config.keystroke_suffix())
    }

    fn clock(&self) -> Self::Clock {
        SystemClock
    }
}

/// Service dependencies required to construct the runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn ActivityReporter>,
}

/// Collaborators required to launch an engine.
pub(crate) struct LaunchPlan<L, S, H> {
    pub(crate) services: ServiceDeps<L>,
    pub(crate) shutdown: S,
    pub(crate) hardware: H,
}

type SystemPlan = LaunchPlan<SystemConfigLoader, SystemShutdownSignal, SystemHardware>;

fn production_plan() -> Result<SystemPlan, LaunchError> {
    Ok(LaunchPlan {
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredActivityReporter::new()),
        },
        shutdown: SystemShutdownSignal::install()?,
        hardware: SystemHardware,
    })
}

/// Runs the dispatcher using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when startup fails or the loop stops on an error.
pub fn run_dispatcher() -> Result<DispatchSummary, LaunchError> {
    run_dispatcher_with(production_plan()?)
}

/// Runs the poller using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when startup fails or the loop stops on an error.
pub fn run_poller() -> Result<PollSummary, LaunchError> {
    run_poller_with(production_plan()?)
}

/// Runs the dispatcher with injected collaborators.
pub(crate) fn run_dispatcher_with<L, S, H>(
    plan: LaunchPlan<L, S, H>,
) -> Result<DispatchSummary, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
    H: Hardware,
{
    let LaunchPlan {
        services,
        shutdown,
        hardware,
    } = plan;
    let ServiceDeps { loader, reporter } = services;

    let runtime = bootstrap_with(&loader, Arc::clone(&reporter), Role::Dispatcher)?;
    let telemetry = runtime.telemetry();
    let (config, rules) = runtime.into_dispatcher()?;
    let endpoint = config.pipe_endpoint();
    info!(
        target: PROCESS_TARGET,
        pipes = %endpoint,
        rules = rules.len(),
        "starting dispatcher"
    );

    let flag = ShutdownFlag::new();
    let watcher = ShutdownWatcher::spawn(shutdown, flag.clone(), Some(endpoint.clone()))?;
    let result = NamedPipeChannel::open(&endpoint)
        .map_err(LaunchError::from)
        .and_then(|channel| {
            DispatchLoop::new(channel, rules, hardware.pins(&config), hardware.clock())
                .with_reporter(reporter)
                .with_shutdown(flag)
                .run()
                .map_err(LaunchError::from)
        });
    watcher.stop();

    info!(target: PROCESS_TARGET, ok = result.is_ok(), "dispatcher finished");
    telemetry.flush();
    result
}

/// Runs the poller with injected collaborators.
pub(crate) fn run_poller_with<L, S, H>(plan: LaunchPlan<L, S, H>) -> Result<PollSummary, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
    H: Hardware,
{
    let LaunchPlan {
        services,
        shutdown,
        hardware,
    } = plan;
    let ServiceDeps { loader, reporter } = services;

    let runtime = bootstrap_with(&loader, Arc::clone(&reporter), Role::Poller)?;
    let telemetry = runtime.telemetry();
    let (config, rules) = runtime.into_poller()?;
    info!(
        target: PROCESS_TARGET,
        rules = rules.len(),
        interval_ms = config.poll_interval_ms,
        "starting poller"
    );

    let flag = ShutdownFlag::new();
    let watcher = ShutdownWatcher::spawn(shutdown, flag.clone(), None)?;
    let result = PollDispatcher::new(
        rules,
        hardware.pins(&config),
        hardware.keys(&config),
        hardware.clock(),
        config.poll_interval(),
    )
    .with_reporter(reporter)
    .with_shutdown(flag)
    .run()
    .map_err(LaunchError::from);
    watcher.stop();

    info!(target: PROCESS_TARGET, ok = result.is_ok(), "poller finished");
    telemetry.flush();
    result
}

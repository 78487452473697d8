//! Startup sequence shared by the dispatcher and the poller.

use std::fmt;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use pinhook_config::{Config, PipePreparationError};
use pinhook_rules::{InputRuleSet, RuleError, RuleSet, ensure_disjoint};

use crate::reporter::ActivityReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Which engine is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Pipe-driven output dispatcher.
    Dispatcher,
    /// Input pin poller.
    Poller,
}

impl Role {
    /// Configuration key naming the rule file this role cannot run without.
    #[must_use]
    pub const fn required_rules(self) -> &'static str {
        match self {
            Self::Dispatcher => "output_rules",
            Self::Poller => "input_rules",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Dispatcher => "dispatcher",
            Self::Poller => "poller",
        })
    }
}

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the runtime configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The rule file the role depends on is not configured.
    #[error("the {role} needs '{setting}' to be configured")]
    MissingRules {
        /// Role that was starting.
        role: Role,
        /// Configuration key that was unset.
        setting: &'static str,
    },
    /// A rule file failed to load or the two files claim the same pin.
    #[error("failed to load rules: {source}")]
    Rules {
        /// Underlying rule error.
        #[source]
        source: RuleError,
    },
    /// The pipe directory could not be prepared.
    #[error("failed to prepare pipe directory: {source}")]
    Pipes {
        /// Filesystem error reported while preparing the directory.
        #[source]
        source: PipePreparationError,
    },
}

/// Result of a successful bootstrap.
#[derive(Debug)]
pub struct Runtime {
    role: Role,
    config: Config,
    outputs: Option<RuleSet>,
    inputs: Option<InputRuleSet>,
    telemetry: TelemetryHandle,
}

impl Runtime {
    /// Role the runtime was bootstrapped for.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Output rules, when configured.
    #[must_use]
    pub const fn output_rules(&self) -> Option<&RuleSet> {
        self.outputs.as_ref()
    }

    /// Input rules, when configured.
    #[must_use]
    pub const fn input_rules(&self) -> Option<&InputRuleSet> {
        self.inputs.as_ref()
    }

    /// Accessor for the telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Splits the runtime into what the dispatcher needs.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::MissingRules`] when no output rules were
    /// loaded.
    pub fn into_dispatcher(self) -> Result<(Config, RuleSet), BootstrapError> {
        match self.outputs {
            Some(rules) => Ok((self.config, rules)),
            None => Err(missing(Role::Dispatcher)),
        }
    }

    /// Splits the runtime into what the poller needs.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::MissingRules`] when no input rules were
    /// loaded.
    pub fn into_poller(self) -> Result<(Config, InputRuleSet), BootstrapError> {
        match self.inputs {
            Some(rules) => Ok((self.config, rules)),
            None => Err(missing(Role::Poller)),
        }
    }
}

const fn missing(role: Role) -> BootstrapError {
    BootstrapError::MissingRules {
        role,
        setting: role.required_rules(),
    }
}

/// Bootstraps `role` using the supplied collaborators.
///
/// Loads the configuration, initialises telemetry, then loads every
/// configured rule file. The rule file of `role` is mandatory. When both
/// files are configured their pins must be disjoint. The dispatcher also
/// prepares the pipe directory.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered; it is reported before
/// being returned. No pin is touched on any failure path.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn ActivityReporter>,
    role: Role,
) -> Result<Runtime, BootstrapError> {
    reporter.bootstrap_starting(role);
    match bootstrap_inner(loader, role) {
        Ok(runtime) => {
            reporter.bootstrap_succeeded(role, runtime.config());
            Ok(runtime)
        }
        Err(error) => {
            reporter.bootstrap_failed(role, &error);
            Err(error)
        }
    }
}

fn bootstrap_inner(loader: &dyn ConfigLoader, role: Role) -> Result<Runtime, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let configured = match role {
        Role::Dispatcher => config.output_rules(),
        Role::Poller => config.input_rules(),
    };
    if configured.is_none() {
        return Err(missing(role));
    }

    let outputs = config
        .output_rules()
        .map(RuleSet::load)
        .transpose()
        .map_err(|source| BootstrapError::Rules { source })?;
    let inputs = config
        .input_rules()
        .map(InputRuleSet::load)
        .transpose()
        .map_err(|source| BootstrapError::Rules { source })?;
    if let (Some(output_set), Some(input_set)) = (&outputs, &inputs) {
        ensure_disjoint(output_set, input_set).map_err(|source| BootstrapError::Rules { source })?;
    }

    if role == Role::Dispatcher {
        config
            .pipe_endpoint()
            .prepare_filesystem()
            .map_err(|source| BootstrapError::Pipes { source })?;
    }

    Ok(Runtime {
        role,
        config,
        outputs,
        inputs,
        telemetry,
    })
}

//! Poller bootstrap orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use inputpoller_config::{ClientBinding, ClientResolutionError, Config};

use crate::backends::{BackendProvider, BackendStartupError, Backends};
use crate::dispatch::{DispatchSettings, MessageDispatcher};
use crate::health::HealthReporter;
use crate::process::ShutdownSignal;
use crate::runtime::{PollLoop, PollSummary, RuntimeError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the poller configuration.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when any source is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;

    /// Reads an environment value used during client resolution.
    fn environment(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a fixed configuration and environment.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigLoader {
    config: Config,
    environment: HashMap<String, String>,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            environment: HashMap::new(),
        }
    }

    /// Adds an environment value visible to client resolution.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }

    fn environment(&self, key: &str) -> Option<String> {
        self.environment.get(key).cloned()
    }
}

/// Errors surfaced during bootstrap. All of them are fatal.
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
    /// Client bindings could not be resolved.
    #[error("failed to resolve client queues: {source}")]
    Clients {
        /// Underlying resolution error.
        #[source]
        source: ClientResolutionError,
    },
    /// A backend could not be connected.
    #[error("failed to connect backend: {source}")]
    Backend {
        /// Underlying backend error.
        #[source]
        source: BackendStartupError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Poller<T, B> {
    config: Config,
    clients: Vec<ClientBinding>,
    dispatcher: MessageDispatcher<T, B>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<T, B> Poller<T, B>
where
    T: crate::transport::QueueTransport,
    B: crate::workflow::WorkflowBackend,
{
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clients the poller serves, in polling order.
    #[must_use]
    pub fn clients(&self) -> &[ClientBinding] {
        &self.clients
    }

    /// Dispatcher shared by all poll workers.
    #[must_use]
    pub fn dispatcher(&self) -> &MessageDispatcher<T, B> {
        &self.dispatcher
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Polls every client until `shutdown` is requested.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if a poll worker cannot be started.
    pub fn run(&self, shutdown: &dyn ShutdownSignal) -> Result<PollSummary, RuntimeError> {
        self.reporter.poller_running(self.clients.len());
        let result = PollLoop::new(
            &self.dispatcher,
            &self.clients,
            self.config.poll_mode(),
            self.reporter.as_ref(),
        )
        .run(shutdown);
        self.reporter.poller_stopped();
        result
    }
}

/// Bootstraps the poller using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, client
/// resolution, or backend construction fails. The reporter is told about the
/// failure before it is returned.
pub fn bootstrap_with<P>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
) -> Result<Poller<P::Transport, P::Workflow>, BootstrapError>
where
    P: BackendProvider,
{
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    let clients = config
        .client_bindings_with(|key| loader.environment(key))
        .map_err(|source| fail(BootstrapError::Clients { source }))?;

    let Backends {
        transport,
        workflow,
    } = Backends::connect(provider, &config, reporter.as_ref())
        .map_err(|source| fail(BootstrapError::Backend { source }))?;

    let dispatcher =
        MessageDispatcher::new(transport, workflow, DispatchSettings::from_config(&config));
    reporter.bootstrap_succeeded(&config, &clients);

    Ok(Poller {
        config,
        clients,
        dispatcher,
        telemetry,
        reporter,
    })
}

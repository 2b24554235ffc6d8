//! Shared configuration for the input poller.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, an
//! optional TOML file selected with `--config-path` (or
//! `INPUT_POLLER_CONFIG_PATH`), `INPUT_POLLER_*` environment variables, and
//! finally command-line flags. The resolved [`Config`] is an explicit value
//! handed to each component at construction; nothing reads it from a global.
//!
//! Client queue bindings come from two sources. Normally they are listed in
//! the configuration (`[[clients]]` tables or repeated `--clients name=queue`
//! flags). When `client_name` is set the poller instead serves a single
//! client whose input queue is read from the `INPUT_QUEUE` environment
//! variable, which suits one-container-per-client deployments.

mod clients;
mod defaults;
mod logging;
mod scheduling;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use clients::{
    ClientBinding, ClientBindingParseError, ClientResolutionError, INPUT_QUEUE_ENV, QueueLocator,
};
pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_RECEIVE_FAILURE_BACKOFF_MS, DEFAULT_WAIT_SECONDS,
    default_log_filter, default_log_filter_string, default_log_format, default_poll_mode,
    default_receive_failure_backoff_ms, default_wait_seconds,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use scheduling::{PollMode, PollModeParseError};

/// Resolved poller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "INPUT_POLLER")]
pub struct Config {
    /// `tracing` filter expression applied to the subscriber.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Enables verbose envelope dumps and debug-level daemon logging.
    #[serde(default)]
    pub debug: bool,
    /// Upper bound on each long-poll receive, in seconds.
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,
    /// Pause after a failed receive before polling that client again.
    #[serde(default = "default_receive_failure_backoff_ms")]
    pub receive_failure_backoff_ms: u64,
    /// Whether clients are polled in turn or by one worker each.
    #[serde(default = "default_poll_mode")]
    pub poll_mode: PollMode,
    /// Clients and the input queues they submit commands on.
    #[serde(default)]
    pub clients: Vec<ClientBinding>,
    /// Serve a single client whose queue is taken from `INPUT_QUEUE`.
    #[serde(default)]
    pub client_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            debug: false,
            wait_seconds: default_wait_seconds(),
            receive_failure_backoff_ms: default_receive_failure_backoff_ms(),
            poll_mode: default_poll_mode(),
            clients: Vec::new(),
            client_name: None,
        }
    }
}

impl Config {
    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Selected log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether debug mode is enabled.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Long-poll wait applied to every receive call.
    #[must_use]
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    /// Delay applied after a receive call fails.
    #[must_use]
    pub fn receive_failure_backoff(&self) -> Duration {
        Duration::from_millis(self.receive_failure_backoff_ms)
    }

    /// Scheduling strategy for the poll loop.
    #[must_use]
    pub fn poll_mode(&self) -> PollMode {
        self.poll_mode
    }

    /// Resolves client bindings using the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::client_bindings_with`].
    pub fn client_bindings(&self) -> Result<Vec<ClientBinding>, ClientResolutionError> {
        self.client_bindings_with(|key| std::env::var(key).ok())
    }

    /// Resolves client bindings, reading environment values through `lookup`.
    ///
    /// In single-client mode (`client_name` set) the configured client list is
    /// ignored and the queue comes from [`INPUT_QUEUE_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientResolutionError`] when no client is configured, when a
    /// name or queue is blank, when a name repeats, or when single-client mode
    /// cannot find its queue.
    pub fn client_bindings_with<F>(&self, lookup: F) -> Result<Vec<ClientBinding>, ClientResolutionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.client_name.as_deref() {
            Some(name) => clients::single_client(name, lookup).map(|binding| vec![binding]),
            None => clients::validate_bindings(&self.clients),
        }
    }
}

//! Structured health reporting for poller lifecycle events.

use std::sync::Arc;

use inputpoller_config::{ClientBinding, Config};

use crate::backends::{BackendKind, BackendStartupError};
use crate::bootstrap::BootstrapError;
use crate::dispatch::CycleOutcome;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, clients: &[ClientBinding]);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a backend is connected.
    fn backend_starting(&self, kind: BackendKind);

    /// Invoked after a backend connects successfully.
    fn backend_ready(&self, kind: BackendKind);

    /// Invoked when a backend fails to connect.
    fn backend_failed(&self, error: &BackendStartupError);

    /// Invoked once the poll loop starts serving clients.
    fn poller_running(&self, clients: usize);

    /// Invoked after every poll cycle, whatever its outcome.
    fn cycle_completed(&self, client: &ClientBinding, outcome: &CycleOutcome);

    /// Invoked after the poll loop has drained and returned.
    fn poller_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, clients: &[ClientBinding]) {
        (**self).bootstrap_succeeded(config, clients);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn backend_starting(&self, kind: BackendKind) {
        (**self).backend_starting(kind);
    }

    fn backend_ready(&self, kind: BackendKind) {
        (**self).backend_ready(kind);
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        (**self).backend_failed(error);
    }

    fn poller_running(&self, clients: usize) {
        (**self).poller_running(clients);
    }

    fn cycle_completed(&self, client: &ClientBinding, outcome: &CycleOutcome) {
        (**self).cycle_completed(client, outcome);
    }

    fn poller_stopped(&self) {
        (**self).poller_stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting poller bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, clients: &[ClientBinding]) {
        let names: Vec<&str> = clients.iter().map(ClientBinding::name).collect();
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            poll_mode = %config.poll_mode(),
            wait_seconds = config.wait_seconds,
            debug = config.debug(),
            clients = ?names,
            "poller bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            severity = "FATAL",
            error = %error,
            "poller bootstrap failed"
        );
    }

    fn backend_starting(&self, kind: BackendKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "backend_starting",
            backend = %kind,
            "connecting backend"
        );
    }

    fn backend_ready(&self, kind: BackendKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "backend_ready",
            backend = %kind,
            "backend ready"
        );
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "backend_failed",
            severity = "FATAL",
            backend = %error.kind,
            detail = %error.message(),
            error = ?error,
            "backend failed to start"
        );
    }

    fn poller_running(&self, clients: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "poller_running",
            clients,
            "polling client input queues"
        );
    }

    fn cycle_completed(&self, client: &ClientBinding, outcome: &CycleOutcome) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "cycle_completed",
            client = client.name(),
            outcome = outcome.label(),
            "poll cycle completed"
        );
    }

    fn poller_stopped(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "poller_stopped",
            "poller stopped"
        );
    }
}

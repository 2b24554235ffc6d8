//! Supervises poller launch sequencing.

use std::sync::Arc;

use tracing::info;

use crate::backends::BackendProvider;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::runtime::PollSummary;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the poller using the production collaborators.
///
/// Signal handlers are installed before bootstrap so a signal arriving during
/// start-up still stops the loop before its first cycle.
///
/// # Errors
///
/// Returns [`LaunchError`] when signal installation, bootstrap, or the poll
/// loop fails.
pub fn run_poller() -> Result<(), LaunchError> {
    let shutdown = SystemShutdownSignal::install()?;
    let reporter = Arc::new(StructuredHealthReporter::new());
    let provider = default_provider();
    run_poller_with(&SystemConfigLoader, reporter, &provider, &shutdown).map(|_| ())
}

/// Runs the poller with injected collaborators.
///
/// # Errors
///
/// See [`run_poller`].
pub fn run_poller_with<P>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &P,
    shutdown: &dyn ShutdownSignal,
) -> Result<PollSummary, LaunchError>
where
    P: BackendProvider,
{
    info!(target: PROCESS_TARGET, "starting input poller");
    let poller = bootstrap_with(loader, reporter, provider)?;
    let summary = poller.run(shutdown)?;
    info!(
        target: PROCESS_TARGET,
        cycles = summary.cycles(),
        "shutdown sequence completed"
    );
    Ok(summary)
}

#[cfg(feature = "aws")]
fn default_provider() -> impl BackendProvider {
    crate::aws::AwsBackendProvider::new()
}

#[cfg(not(feature = "aws"))]
fn default_provider() -> impl BackendProvider {
    crate::unavailable_provider::UnavailableBackendProvider
}

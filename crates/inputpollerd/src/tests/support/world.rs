//! BDD test world: encapsulates loader, reporter, provider, and poller state
//! for bootstrap step functions.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, Poller, bootstrap_with};
use crate::runtime::PollSummary;
use crate::transport::MemoryQueueTransport;

use super::backend_provider::RecordingBackendProvider;
use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;
use super::workflow::RecordingWorkflowBackend;

type TestPoller = Poller<Arc<MemoryQueueTransport>, Arc<RecordingWorkflowBackend>>;

enum LoaderChoice {
    Healthy(TestConfigLoader),
    Failing,
}

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: LoaderChoice,
    pub reporter: Arc<RecordingHealthReporter>,
    pub provider: RecordingBackendProvider,
    poller: Option<TestPoller>,
    bootstrap_error: Option<BootstrapError>,
    pub summary: Option<PollSummary>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: LoaderChoice::Healthy(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::stopping_after(1)),
            provider: RecordingBackendProvider::default(),
            poller: None,
            bootstrap_error: None,
            summary: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = LoaderChoice::Failing;
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = LoaderChoice::Healthy(TestConfigLoader::new());
        self.reset_results();
    }

    /// Mutable access to the healthy loader, installing one if needed.
    pub fn healthy_loader(&mut self) -> &mut TestConfigLoader {
        if !matches!(self.loader, LoaderChoice::Healthy(_)) {
            self.loader = LoaderChoice::Healthy(TestConfigLoader::new());
        }
        match &mut self.loader {
            LoaderChoice::Healthy(loader) => loader,
            LoaderChoice::Failing => unreachable!("healthy loader installed above"),
        }
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.poller.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        let result = match &self.loader {
            LoaderChoice::Healthy(loader) => {
                bootstrap_with(loader, self.reporter.clone(), &self.provider)
            }
            LoaderChoice::Failing => {
                bootstrap_with(&FailingConfigLoader, self.reporter.clone(), &self.provider)
            }
        };
        match result {
            Ok(poller) => self.poller = Some(poller),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Runs the poll loop until the reporter requests shutdown.
    pub fn run(&mut self) -> Result<(), String> {
        let poller = self
            .poller
            .as_ref()
            .ok_or_else(|| "poller was not bootstrapped".to_owned())?;
        let summary = poller
            .run(self.reporter.as_ref())
            .map_err(|error| error.to_string())?;
        self.summary = Some(summary);
        Ok(())
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped poller, if any.
    #[must_use]
    pub fn poller(&self) -> Option<&TestPoller> {
        self.poller.as_ref()
    }

    fn reset_results(&mut self) {
        self.poller = None;
        self.bootstrap_error = None;
        self.summary = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

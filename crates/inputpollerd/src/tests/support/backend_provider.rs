//! Test backend provider: hands out shared in-memory backends, records
//! connection requests, and supports injected failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use inputpoller_config::Config;

use crate::backends::{BackendKind, BackendProvider, BackendStartupError};
use crate::transport::MemoryQueueTransport;

use super::workflow::RecordingWorkflowBackend;

/// Backend provider that records requests and supports injected failures.
#[derive(Clone, Default)]
pub struct RecordingBackendProvider {
    state: Arc<Mutex<BackendState>>,
    transport: Arc<MemoryQueueTransport>,
    workflow: Arc<RecordingWorkflowBackend>,
}

impl RecordingBackendProvider {
    /// Configures the provider to fail for the specified backend.
    pub fn fail_on(&self, kind: BackendKind, message: impl Into<String>) {
        let mut state = self.state.lock().expect("backend state mutex poisoned");
        state.failures.insert(kind, message.into());
    }

    /// Returns all backends that were requested, in order.
    #[must_use]
    pub fn recorded_connects(&self) -> Vec<BackendKind> {
        let state = self.state.lock().expect("backend state mutex poisoned");
        state.connects.clone()
    }

    /// Queue transport handed to the poller.
    #[must_use]
    pub fn transport(&self) -> Arc<MemoryQueueTransport> {
        Arc::clone(&self.transport)
    }

    /// Workflow backend handed to the poller.
    #[must_use]
    pub fn workflow(&self) -> Arc<RecordingWorkflowBackend> {
        Arc::clone(&self.workflow)
    }

    fn record(&self, kind: BackendKind) -> Result<(), BackendStartupError> {
        let failure = {
            let mut state = self.state.lock().expect("backend state mutex poisoned");
            state.connects.push(kind);
            state.failures.get(&kind).cloned()
        };
        match failure {
            Some(message) => Err(BackendStartupError::new(kind, message)),
            None => Ok(()),
        }
    }
}

impl BackendProvider for RecordingBackendProvider {
    type Transport = Arc<MemoryQueueTransport>;
    type Workflow = Arc<RecordingWorkflowBackend>;

    fn connect_queue(&self, config: &Config) -> Result<Self::Transport, BackendStartupError> {
        self.record(BackendKind::Queue)?;
        for client in &config.clients {
            self.transport.create_queue(client.input_queue());
        }
        Ok(self.transport())
    }

    fn connect_workflow(&self, _config: &Config) -> Result<Self::Workflow, BackendStartupError> {
        self.record(BackendKind::Workflow)?;
        Ok(self.workflow())
    }
}

#[derive(Default)]
struct BackendState {
    connects: Vec<BackendKind>,
    failures: HashMap<BackendKind, String>,
}

//! Workflow backend double that records start requests.

use std::sync::Mutex;

use crate::workflow::{BackendSubmissionError, WorkflowBackend, WorkflowRun, WorkflowStartRequest};

/// Records every start request and answers with a fixed run id, or rejects.
#[derive(Debug, Default)]
pub struct RecordingWorkflowBackend {
    requests: Mutex<Vec<WorkflowStartRequest>>,
    rejection: Mutex<Option<String>>,
}

impl RecordingWorkflowBackend {
    /// Run id returned for accepted requests.
    pub const RUN_ID: &'static str = "run-1";

    /// Makes later requests fail with `message`.
    pub fn reject_with(&self, message: impl Into<String>) {
        *self.rejection.lock().expect("rejection mutex poisoned") = Some(message.into());
    }

    /// Snapshot of recorded requests.
    #[must_use]
    pub fn requests(&self) -> Vec<WorkflowStartRequest> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .clone()
    }
}

impl WorkflowBackend for RecordingWorkflowBackend {
    fn start_workflow(
        &self,
        request: &WorkflowStartRequest,
    ) -> Result<WorkflowRun, BackendSubmissionError> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());
        let rejection = self
            .rejection
            .lock()
            .expect("rejection mutex poisoned")
            .clone();
        match rejection {
            Some(message) => Err(BackendSubmissionError::new(
                request.workflow_id.clone(),
                message,
            )),
            None => Ok(WorkflowRun::new(Self::RUN_ID)),
        }
    }
}

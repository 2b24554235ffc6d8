//! Workflow backend consumed by the job launch handler.
//!
//! Only the start call is modelled. The request mirrors the orchestration
//! service's `StartWorkflowExecution` shape: a domain, a caller-chosen
//! workflow id, the workflow type, a task list, and an opaque input string
//! that the backend hands to the workflow unchanged.

#[cfg(feature = "aws")]
mod swf;

use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "aws")]
pub use self::swf::SwfWorkflowBackend;

/// Name and version pair identifying a registered workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowType {
    /// Registered workflow name.
    pub name: String,
    /// Registered workflow version.
    pub version: String,
}

/// Task list the first decision task is scheduled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskList {
    /// Task list name.
    pub name: String,
}

/// Request to start one workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStartRequest {
    /// Orchestration domain the workflow runs in.
    pub domain: String,
    /// Caller-generated identifier, unique per request.
    pub workflow_id: String,
    /// Workflow type to instantiate.
    pub workflow_type: WorkflowType,
    /// Task list for the execution's decision tasks.
    pub task_list: TaskList,
    /// Serialised command payload passed through to the workflow.
    pub input: String,
}

/// Identifier the backend assigned to a started execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// Backend run identifier.
    pub run_id: String,
}

impl WorkflowRun {
    /// Wraps a run identifier.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

/// The backend rejected or failed a start request.
#[derive(Debug, Error)]
#[error("workflow backend rejected start of '{workflow_id}': {message}")]
pub struct BackendSubmissionError {
    /// Workflow id of the failed request.
    pub workflow_id: String,
    message: String,
    /// Underlying client error, when available.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendSubmissionError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        workflow_id: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable failure detail.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Starts workflow executions on the orchestration backend.
pub trait WorkflowBackend: Send + Sync {
    /// Submits a start request and returns the backend's run identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BackendSubmissionError`] when the request is rejected or the
    /// backend cannot be reached.
    fn start_workflow(
        &self,
        request: &WorkflowStartRequest,
    ) -> Result<WorkflowRun, BackendSubmissionError>;
}

impl<T> WorkflowBackend for std::sync::Arc<T>
where
    T: WorkflowBackend + ?Sized,
{
    fn start_workflow(
        &self,
        request: &WorkflowStartRequest,
    ) -> Result<WorkflowRun, BackendSubmissionError> {
        (**self).start_workflow(request)
    }
}

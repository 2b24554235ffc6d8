//! SWF implementation of [`WorkflowBackend`].

use std::sync::Arc;

use aws_sdk_swf::Client;
use aws_sdk_swf::error::DisplayErrorContext;
use aws_sdk_swf::types;
use tokio::runtime::Runtime;

use super::{BackendSubmissionError, WorkflowBackend, WorkflowRun, WorkflowStartRequest};

/// Workflow backend over SWF `StartWorkflowExecution`.
#[derive(Debug, Clone)]
pub struct SwfWorkflowBackend {
    client: Client,
    runtime: Arc<Runtime>,
}

impl SwfWorkflowBackend {
    /// Wraps an SWF client and the runtime used to drive it.
    #[must_use]
    pub fn new(client: Client, runtime: Arc<Runtime>) -> Self {
        Self { client, runtime }
    }
}

impl WorkflowBackend for SwfWorkflowBackend {
    fn start_workflow(
        &self,
        request: &WorkflowStartRequest,
    ) -> Result<WorkflowRun, BackendSubmissionError> {
        let invalid = |error: aws_sdk_swf::error::BuildError| {
            BackendSubmissionError::with_source(
                request.workflow_id.as_str(),
                "invalid start request",
                error,
            )
        };
        let workflow_type = types::WorkflowType::builder()
            .name(request.workflow_type.name.as_str())
            .version(request.workflow_type.version.as_str())
            .build()
            .map_err(invalid)?;
        let task_list = types::TaskList::builder()
            .name(request.task_list.name.as_str())
            .build()
            .map_err(invalid)?;

        let call = self
            .client
            .start_workflow_execution()
            .domain(request.domain.as_str())
            .workflow_id(request.workflow_id.as_str())
            .workflow_type(workflow_type)
            .task_list(task_list)
            .input(request.input.as_str())
            .send();
        let output = self.runtime.block_on(call).map_err(|error| {
            BackendSubmissionError::with_source(
                request.workflow_id.as_str(),
                DisplayErrorContext(&error).to_string(),
                error,
            )
        })?;

        output.run_id().map(WorkflowRun::new).ok_or_else(|| {
            BackendSubmissionError::new(
                request.workflow_id.as_str(),
                "response carried no run id",
            )
        })
    }
}

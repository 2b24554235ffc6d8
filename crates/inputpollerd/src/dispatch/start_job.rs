//! `START_JOB` handler.

use tracing::{debug, error, info};
use uuid::Uuid;

use super::dispatcher::DISPATCH_TARGET;
use super::envelope::CommandEnvelope;
use super::errors::DispatchError;
use super::registry::{CommandOutcome, HandlerContext};
use crate::workflow::{TaskList, WorkflowStartRequest, WorkflowType};

/// Builds a start request from `data.workflow` and submits it.
///
/// A rejected submission is logged and reported as
/// [`CommandOutcome::SubmissionFailed`]; it is not a dispatch error.
///
/// # Errors
///
/// Returns `DispatchError::InvalidEnvelope` if the workflow block is missing
/// or incomplete, or `DispatchError::EncodeInput` if the payload cannot be
/// serialised.
pub(crate) fn handle(
    context: &HandlerContext<'_>,
    envelope: &CommandEnvelope,
) -> Result<CommandOutcome, DispatchError> {
    let request = build_request(envelope)?;

    debug!(
        target: DISPATCH_TARGET,
        client = context.client.name(),
        job_id = envelope.job_id(),
        workflow_id = %request.workflow_id,
        domain = %request.domain,
        workflow = %request.workflow_type.name,
        version = %request.workflow_type.version,
        "starting new workflow"
    );

    match context.backend.start_workflow(&request) {
        Ok(run) => {
            info!(
                target: DISPATCH_TARGET,
                client = context.client.name(),
                job_id = envelope.job_id(),
                workflow_id = %request.workflow_id,
                run_id = %run.run_id,
                "new workflow started with run id {}",
                run.run_id
            );
            Ok(CommandOutcome::WorkflowStarted {
                workflow_id: request.workflow_id,
                run_id: run.run_id,
            })
        }
        Err(failure) => {
            error!(
                target: DISPATCH_TARGET,
                client = context.client.name(),
                job_id = envelope.job_id(),
                workflow_id = %request.workflow_id,
                error = %failure,
                "failed to start workflow"
            );
            Ok(CommandOutcome::SubmissionFailed {
                workflow_id: request.workflow_id,
                error: failure,
            })
        }
    }
}

fn build_request(envelope: &CommandEnvelope) -> Result<WorkflowStartRequest, DispatchError> {
    let workflow = envelope.require_workflow()?;
    Ok(WorkflowStartRequest {
        domain: workflow.domain()?,
        workflow_id: Uuid::new_v4().hyphenated().to_string(),
        workflow_type: WorkflowType {
            name: workflow.name()?,
            version: workflow.version()?,
        },
        task_list: TaskList {
            name: workflow.task_list()?,
        },
        input: envelope.data_json()?,
    })
}

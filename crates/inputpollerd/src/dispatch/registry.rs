//! Command type routing.
//!
//! Incoming envelopes name their command in the `type` field. The registry
//! maps those names onto [`CommandKind`] and each kind onto a handler
//! function. Names outside the table are rejected with
//! [`DispatchError::UnknownCommand`]; names inside it whose behaviour is
//! owned elsewhere resolve to a handler that reports
//! [`CommandOutcome::NotImplemented`].

use std::fmt;

use inputpoller_config::ClientBinding;
use tracing::warn;

use super::dispatcher::DISPATCH_TARGET;
use super::envelope::CommandEnvelope;
use super::errors::DispatchError;
use super::start_job;
use crate::workflow::{BackendSubmissionError, WorkflowBackend};

/// Commands clients are known to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Start a workflow execution.
    StartJob,
    /// Cancel a running job.
    CancelJob,
    /// Cancel a running activity.
    CancelActivity,
    /// List jobs.
    GetJobList,
    /// List activities.
    GetActivityList,
    /// Query one job.
    GetJobStatus,
    /// Query one activity.
    GetActivityStatus,
}

impl CommandKind {
    const COUNT: usize = 7;

    /// Every known kind, in wire-protocol order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::StartJob,
        Self::CancelJob,
        Self::CancelActivity,
        Self::GetJobList,
        Self::GetActivityList,
        Self::GetJobStatus,
        Self::GetActivityStatus,
    ];

    /// Parses a wire name. Matching is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCommand` if the name is not known.
    pub fn parse(value: &str) -> Result<Self, DispatchError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DispatchError::unknown_command(value))
    }

    /// Position in [`CommandKind::ALL`].
    const fn index(self) -> usize {
        self as usize
    }

    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartJob => "START_JOB",
            Self::CancelJob => "CANCEL_JOB",
            Self::CancelActivity => "CANCEL_ACTIVITY",
            Self::GetJobList => "GET_JOB_LIST",
            Self::GetActivityList => "GET_ACTIVITY_LIST",
            Self::GetJobStatus => "GET_JOB_STATUS",
            Self::GetActivityStatus => "GET_ACTIVITY_STATUS",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Collaborators available to a handler for one message.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Kind the envelope resolved to.
    pub kind: CommandKind,
    /// Client whose queue delivered the message.
    pub client: &'a ClientBinding,
    /// Backend used to start workflows.
    pub backend: &'a dyn WorkflowBackend,
}

impl fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HandlerContext")
            .field("kind", &self.kind)
            .field("client", &self.client.name())
            .finish_non_exhaustive()
    }
}

/// What a handler did with a valid command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The backend accepted the start request.
    WorkflowStarted {
        /// Identifier generated for the request.
        workflow_id: String,
        /// Run identifier returned by the backend.
        run_id: String,
    },
    /// The backend rejected the start request. The message is still consumed.
    SubmissionFailed {
        /// Identifier generated for the request.
        workflow_id: String,
        /// Backend failure.
        error: BackendSubmissionError,
    },
    /// The command is known but has no handler in this service.
    NotImplemented {
        /// Kind that was requested.
        kind: CommandKind,
    },
}

/// Signature shared by all command handlers.
pub type CommandHandler =
    fn(&HandlerContext<'_>, &CommandEnvelope) -> Result<CommandOutcome, DispatchError>;

/// Immutable table from command kind to handler, indexed by kind.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    handlers: [CommandHandler; CommandKind::COUNT],
}

impl CommandRegistry {
    /// Builds the registry with a handler for every [`CommandKind`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: CommandKind::ALL.map(handler_for),
        }
    }

    /// Looks up the handler for a wire command name.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCommand` when the name is not known.
    pub fn resolve(&self, type_name: &str) -> Result<(CommandKind, CommandHandler), DispatchError> {
        let kind = CommandKind::parse(type_name)?;
        Ok((kind, self.handler(kind)))
    }

    /// Handler registered for `kind`.
    #[must_use]
    pub fn handler(&self, kind: CommandKind) -> CommandHandler {
        self.handlers[kind.index()]
    }

    /// Kinds with a registered handler.
    pub fn kinds(&self) -> impl Iterator<Item = CommandKind> + '_ {
        CommandKind::ALL.into_iter()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn handler_for(kind: CommandKind) -> CommandHandler {
    match kind {
        CommandKind::StartJob => start_job::handle,
        CommandKind::CancelJob
        | CommandKind::CancelActivity
        | CommandKind::GetJobList
        | CommandKind::GetActivityList
        | CommandKind::GetJobStatus
        | CommandKind::GetActivityStatus => not_implemented,
    }
}

fn not_implemented(
    context: &HandlerContext<'_>,
    envelope: &CommandEnvelope,
) -> Result<CommandOutcome, DispatchError> {
    warn!(
        target: DISPATCH_TARGET,
        client = context.client.name(),
        job_id = envelope.job_id(),
        command = context.kind.as_str(),
        "command is not implemented by this service"
    );
    Ok(CommandOutcome::NotImplemented { kind: context.kind })
}

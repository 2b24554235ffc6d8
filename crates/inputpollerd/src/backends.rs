//! Construction of the poller's external collaborators.
//!
//! The poller needs two backends before it can run: a queue transport for the
//! client input queues and a workflow backend for launching jobs. Both are
//! built once at start-up by a [`BackendProvider`] so production can wire the
//! cloud adapters while tests wire in-process doubles.

use std::fmt;

use thiserror::Error;

use inputpoller_config::Config;

use crate::health::HealthReporter;
use crate::transport::QueueTransport;
use crate::workflow::WorkflowBackend;

/// External services the poller depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Queue transport serving client input queues.
    Queue,
    /// Workflow orchestration backend.
    Workflow,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Queue => "queue",
            Self::Workflow => "workflow",
        };
        formatter.write_str(label)
    }
}

/// Errors surfaced when a backend cannot be constructed.
#[derive(Debug, Error)]
#[error("{kind} backend failed to start: {message}")]
pub struct BackendStartupError {
    /// Kind of backend that failed.
    pub kind: BackendKind,
    message: String,
    /// Optional source error reported by the backend implementation.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendStartupError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(kind: BackendKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        kind: BackendKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Builds the queue transport and workflow backend.
pub trait BackendProvider {
    /// Transport used for receive and delete calls.
    type Transport: QueueTransport;
    /// Backend used for workflow starts.
    type Workflow: WorkflowBackend;

    /// Connects the queue transport.
    ///
    /// # Errors
    ///
    /// Returns [`BackendStartupError`] when the transport cannot be built.
    fn connect_queue(&self, config: &Config) -> Result<Self::Transport, BackendStartupError>;

    /// Connects the workflow backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendStartupError`] when the backend cannot be built.
    fn connect_workflow(&self, config: &Config) -> Result<Self::Workflow, BackendStartupError>;
}

/// Connected collaborators, ready to hand to a dispatcher.
#[derive(Debug)]
pub struct Backends<T, B> {
    /// Queue transport.
    pub transport: T,
    /// Workflow backend.
    pub workflow: B,
}

impl<T, B> Backends<T, B>
where
    T: QueueTransport,
    B: WorkflowBackend,
{
    /// Connects both backends, reporting each step.
    ///
    /// The queue is connected first; a failure there skips the workflow
    /// backend entirely.
    ///
    /// # Errors
    ///
    /// Returns the first [`BackendStartupError`] encountered.
    pub fn connect<P>(
        provider: &P,
        config: &Config,
        reporter: &dyn HealthReporter,
    ) -> Result<Self, BackendStartupError>
    where
        P: BackendProvider<Transport = T, Workflow = B>,
    {
        let transport = connect_reported(BackendKind::Queue, reporter, || {
            provider.connect_queue(config)
        })?;
        let workflow = connect_reported(BackendKind::Workflow, reporter, || {
            provider.connect_workflow(config)
        })?;
        Ok(Self {
            transport,
            workflow,
        })
    }
}

fn connect_reported<R>(
    kind: BackendKind,
    reporter: &dyn HealthReporter,
    connect: impl FnOnce() -> Result<R, BackendStartupError>,
) -> Result<R, BackendStartupError> {
    reporter.backend_starting(kind);
    match connect() {
        Ok(backend) => {
            reporter.backend_ready(kind);
            Ok(backend)
        }
        Err(error) => {
            reporter.backend_failed(&error);
            Err(error)
        }
    }
}

//! Provider used when no cloud adapters are compiled in.

use std::sync::Arc;

use inputpoller_config::Config;

use crate::transport::QueueTransport;
use crate::workflow::WorkflowBackend;
use crate::{BackendKind, BackendProvider, BackendStartupError};

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backends::unavailable");

/// Backend provider that refuses to connect anything.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UnavailableBackendProvider;

impl UnavailableBackendProvider {
    fn refuse(kind: BackendKind) -> BackendStartupError {
        tracing::warn!(
            target: BACKEND_TARGET,
            backend = %kind,
            "backend requested but no adapter is compiled in"
        );
        BackendStartupError::new(
            kind,
            "no adapter compiled in; rebuild inputpollerd with the `aws` feature",
        )
    }
}

impl BackendProvider for UnavailableBackendProvider {
    type Transport = Arc<dyn QueueTransport>;
    type Workflow = Arc<dyn WorkflowBackend>;

    fn connect_queue(&self, _config: &Config) -> Result<Self::Transport, BackendStartupError> {
        Err(Self::refuse(BackendKind::Queue))
    }

    fn connect_workflow(&self, _config: &Config) -> Result<Self::Workflow, BackendStartupError> {
        Err(Self::refuse(BackendKind::Workflow))
    }
}

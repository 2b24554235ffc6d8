//! Cloud adapters backed by SQS and SWF.
//!
//! Both clients share one SDK configuration and one Tokio runtime. The poll
//! loop stays synchronous; each adapter blocks on its SDK future.

use std::sync::Arc;

use aws_config::{BehaviorVersion, SdkConfig};
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Runtime};

use inputpoller_config::Config;

use crate::backends::{BackendKind, BackendProvider, BackendStartupError};
use crate::transport::SqsQueueTransport;
use crate::workflow::SwfWorkflowBackend;

const AWS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backends::aws");

#[derive(Debug, Clone)]
struct AwsSession {
    runtime: Arc<Runtime>,
    sdk: SdkConfig,
}

/// Provider that connects the SQS transport and SWF backend from the default
/// credential and region chain.
#[derive(Debug, Default)]
pub struct AwsBackendProvider {
    session: OnceCell<AwsSession>,
}

impl AwsBackendProvider {
    /// Builds a provider; nothing connects until a backend is requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self, kind: BackendKind) -> Result<&AwsSession, BackendStartupError> {
        self.session.get_or_try_init(|| {
            let runtime = Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("inputpollerd-aws")
                .enable_all()
                .build()
                .map_err(|source| {
                    BackendStartupError::with_source(kind, "failed to start async runtime", source)
                })?;
            let sdk = runtime.block_on(aws_config::defaults(BehaviorVersion::latest()).load());
            tracing::info!(
                target: AWS_TARGET,
                region = ?sdk.region().map(|region| region.as_ref().to_owned()),
                "loaded cloud configuration"
            );
            Ok(AwsSession {
                runtime: Arc::new(runtime),
                sdk,
            })
        })
    }
}

impl BackendProvider for AwsBackendProvider {
    type Transport = SqsQueueTransport;
    type Workflow = SwfWorkflowBackend;

    fn connect_queue(&self, _config: &Config) -> Result<Self::Transport, BackendStartupError> {
        let session = self.session(BackendKind::Queue)?;
        Ok(SqsQueueTransport::new(
            aws_sdk_sqs::Client::new(&session.sdk),
            Arc::clone(&session.runtime),
        ))
    }

    fn connect_workflow(&self, _config: &Config) -> Result<Self::Workflow, BackendStartupError> {
        let session = self.session(BackendKind::Workflow)?;
        Ok(SwfWorkflowBackend::new(
            aws_sdk_swf::Client::new(&session.sdk),
            Arc::clone(&session.runtime),
        ))
    }
}

//! One receive → handle → delete cycle per call.
//!
//! The dispatcher never lets a per-message failure escape: every outcome,
//! including transport failures, is returned as a [`CycleOutcome`] value so
//! the poll loop can report it and move on.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use inputpoller_config::{ClientBinding, Config};
use tracing::{debug, error, info};

use super::envelope::CommandEnvelope;
use super::errors::DispatchError;
use super::registry::{CommandKind, CommandOutcome, CommandRegistry, HandlerContext};
use crate::process::ShutdownSignal;
use crate::transport::{InboundMessage, QueueTransport, TransportError};
use crate::workflow::WorkflowBackend;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Longest single receive call; shutdown is checked between slices.
pub const RECEIVE_SLICE: Duration = Duration::from_secs(1);

/// Per-process dispatch settings copied from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Log each envelope pretty-printed at DEBUG before dispatch.
    pub debug: bool,
    /// Long-poll wait for each receive.
    pub wait: Duration,
    /// Pause after a failed receive.
    pub receive_failure_backoff: Duration,
}

impl DispatchSettings {
    /// Extracts the dispatch-relevant values from the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            debug: config.debug(),
            wait: config.wait(),
            receive_failure_backoff: config.receive_failure_backoff(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of handling one received message.
#[derive(Debug)]
pub enum Disposition {
    /// A handler ran.
    Dispatched {
        /// Kind the message resolved to.
        kind: CommandKind,
        /// What the handler reported.
        outcome: CommandOutcome,
    },
    /// The message was rejected before any handler ran.
    Rejected(DispatchError),
}

impl Disposition {
    /// Whether a handler was invoked.
    #[must_use]
    pub fn was_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Result of one poll cycle for one client.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The long-poll elapsed without a message.
    Idle,
    /// The receive call failed; nothing was deleted.
    ReceiveFailed(TransportError),
    /// A message was received, handled, and a delete attempted.
    Handled {
        /// Handling result.
        disposition: Disposition,
        /// Result of the delete call.
        deletion: Result<(), TransportError>,
    },
}

impl CycleOutcome {
    /// Short label for structured logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ReceiveFailed(_) => "receive_failed",
            Self::Handled {
                deletion: Err(_), ..
            } => "delete_failed",
            Self::Handled {
                disposition: Disposition::Dispatched { .. },
                ..
            } => "dispatched",
            Self::Handled {
                disposition: Disposition::Rejected(_),
                ..
            } => "rejected",
        }
    }
}

/// Runs poll cycles against a queue transport and workflow backend.
#[derive(Debug)]
pub struct MessageDispatcher<T, B> {
    transport: T,
    backend: B,
    registry: CommandRegistry,
    settings: DispatchSettings,
}

impl<T, B> MessageDispatcher<T, B>
where
    T: QueueTransport,
    B: WorkflowBackend,
{
    /// Creates a dispatcher with the standard command registry.
    pub fn new(transport: T, backend: B, settings: DispatchSettings) -> Self {
        Self {
            transport,
            backend,
            registry: CommandRegistry::new(),
            settings,
        }
    }

    /// Settings the dispatcher was built with.
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Underlying queue transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receives at most one message for `client`, handles it, and deletes it.
    pub fn poll_once(&self, client: &ClientBinding) -> CycleOutcome {
        self.poll_until(client, &AtomicBool::new(false))
    }

    /// Like [`Self::poll_once`], but the long-poll is split into
    /// [`RECEIVE_SLICE`] receives and abandons the wait once `shutdown` is
    /// requested. A message that was received is always handled and deleted.
    pub fn poll_until(&self, client: &ClientBinding, shutdown: &dyn ShutdownSignal) -> CycleOutcome {
        let queue = client.input_queue();
        let message = match self.receive(client, shutdown) {
            Ok(Some(message)) => message,
            Ok(None) => return CycleOutcome::Idle,
            Err(failure) => {
                error!(
                    target: DISPATCH_TARGET,
                    client = client.name(),
                    queue = %queue,
                    error = %failure,
                    "failed to receive from input queue"
                );
                return CycleOutcome::ReceiveFailed(failure);
            }
        };

        let disposition = self.handle(client, &message);

        let deletion = self.transport.delete(queue, message.receipt_handle());
        if let Err(failure) = &deletion {
            error!(
                target: DISPATCH_TARGET,
                client = client.name(),
                queue = %queue,
                error = %failure,
                "failed to delete message from input queue"
            );
        }

        CycleOutcome::Handled {
            disposition,
            deletion,
        }
    }

    fn receive(
        &self,
        client: &ClientBinding,
        shutdown: &dyn ShutdownSignal,
    ) -> Result<Option<InboundMessage>, TransportError> {
        let mut remaining = self.settings.wait;
        loop {
            let slice = remaining.min(RECEIVE_SLICE);
            if let Some(message) = self.transport.receive(client.input_queue(), slice)? {
                return Ok(Some(message));
            }
            remaining = remaining.saturating_sub(slice);
            if remaining.is_zero() {
                return Ok(None);
            }
            if shutdown.requested() {
                debug!(
                    target: DISPATCH_TARGET,
                    client = client.name(),
                    "shutdown requested; abandoning long-poll"
                );
                return Ok(None);
            }
        }
    }

    /// Decodes, validates, and dispatches one message without touching the
    /// transport. Each call is an independent attempt.
    pub fn handle(&self, client: &ClientBinding, message: &InboundMessage) -> Disposition {
        match self.dispatch(client, message) {
            Ok((kind, outcome)) => Disposition::Dispatched { kind, outcome },
            Err(failure) => {
                error!(
                    target: DISPATCH_TARGET,
                    client = client.name(),
                    queue = %client.input_queue(),
                    kind = failure.kind(),
                    error = %failure,
                    "rejected message"
                );
                Disposition::Rejected(failure)
            }
        }
    }

    fn dispatch(
        &self,
        client: &ClientBinding,
        message: &InboundMessage,
    ) -> Result<(CommandKind, CommandOutcome), DispatchError> {
        let envelope = CommandEnvelope::parse(message.body())?;
        let (kind, handler) = self.registry.resolve(envelope.command_type())?;
        envelope.require_workflow()?;

        info!(
            target: DISPATCH_TARGET,
            client = client.name(),
            command = kind.as_str(),
            job_id = envelope.job_id(),
            "received command {} for job {}",
            kind,
            envelope.job_id()
        );
        if self.settings.debug {
            debug!(
                target: DISPATCH_TARGET,
                client = client.name(),
                "command envelope:\n{}",
                envelope.to_pretty_json()
            );
        }

        let context = HandlerContext {
            kind,
            client,
            backend: &self.backend,
        };
        let outcome = handler(&context, &envelope)?;
        Ok((kind, outcome))
    }
}

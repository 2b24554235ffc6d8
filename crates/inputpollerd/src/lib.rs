//! Input poller daemon.
//!
//! The poller long-polls one input queue per configured client, decodes each
//! message as a JSON command envelope, and routes it by command type. A
//! `START_JOB` command starts a workflow execution on the orchestration
//! backend; other known commands are acknowledged as not implemented; unknown
//! or malformed commands are logged and dropped. Every received message is
//! deleted after handling, whatever the outcome.
//!
//! Start-up follows a fixed sequence: load layered configuration, install
//! structured telemetry, resolve client bindings, connect the queue transport
//! and workflow backend through a [`BackendProvider`], then run the
//! [`PollLoop`] until a termination signal arrives. Health reporting hooks
//! emit structured events at each stage and after every poll cycle.
//!
//! The cloud adapters (SQS and SWF) live behind the `aws` feature. Without it
//! the daemon refuses to start, while the library remains usable with the
//! in-memory transport and any [`WorkflowBackend`] implementation.

#[cfg(feature = "aws")]
mod aws;
mod backends;
mod bootstrap;
pub mod dispatch;
mod health;
mod process;
mod runtime;
pub mod telemetry;
pub mod transport;
#[cfg(not(feature = "aws"))]
mod unavailable_provider;
pub mod workflow;

#[cfg(feature = "aws")]
pub use aws::AwsBackendProvider;
pub use backends::{BackendKind, BackendProvider, BackendStartupError, Backends};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Poller, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_poller, run_poller_with,
};
pub use runtime::{PollLoop, PollSummary, RuntimeError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::QueueTransport;
pub use workflow::WorkflowBackend;

#[cfg(test)]
mod tests;

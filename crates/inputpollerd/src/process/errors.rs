//! Defines the unified error surface for poller launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::runtime::RuntimeError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the poller process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Installing shutdown signal handlers failed.
    #[error("failed to install shutdown handling: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// Bootstrapping the poller failed.
    #[error("poller bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The poll loop stopped abnormally.
    #[error("poll loop failed: {source}")]
    Runtime {
        /// Underlying runtime error.
        #[source]
        source: RuntimeError,
    },
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<RuntimeError> for LaunchError {
    fn from(source: RuntimeError) -> Self {
        Self::Runtime { source }
    }
}

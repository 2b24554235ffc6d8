use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

const SHUTDOWN_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Polled between cycles to decide whether the loop should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns `true` once shutdown has been requested.
    fn requested(&self) -> bool;
}

impl ShutdownSignal for AtomicBool {
    fn requested(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<T> ShutdownSignal for Arc<T>
where
    T: ShutdownSignal + ?Sized,
{
    fn requested(&self) -> bool {
        (**self).requested()
    }
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown flag raised by SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
#[derive(Debug, Clone)]
pub struct SystemShutdownSignal {
    flag: Arc<AtomicBool>,
    announced: Arc<AtomicBool>,
}

impl SystemShutdownSignal {
    /// Registers the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] if any handler cannot be registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let flag = Arc::new(AtomicBool::new(false));
        for signal in SHUTDOWN_SIGNALS {
            signal_hook::flag::register(signal, Arc::clone(&flag))
                .map_err(|source| ShutdownError::Install { source })?;
        }
        Ok(Self {
            flag,
            announced: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn requested(&self) -> bool {
        let requested = self.flag.load(Ordering::SeqCst);
        if requested && !self.announced.swap(true, Ordering::SeqCst) {
            info!(target: PROCESS_TARGET, "shutdown signal received");
        }
        requested
    }
}

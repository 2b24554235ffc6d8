//! Poll loop driving dispatcher cycles across clients.
//!
//! In sequential mode one thread walks the bindings in order, one cycle per
//! client per pass. In per-client mode each binding gets its own scoped
//! worker thread running the same loop over a single client. Either way the
//! shutdown signal is consulted between cycles and between long-poll slices,
//! never between a receive and its delete, so a cycle that has received a
//! message always reaches its delete.
//!
//! A panicking worker raises the shared abort flag as it unwinds, which stops
//! its siblings at their next check.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use inputpoller_config::{ClientBinding, PollMode};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dispatch::{CycleOutcome, Disposition, MessageDispatcher};
use crate::health::HealthReporter;
use crate::process::ShutdownSignal;
use crate::transport::QueueTransport;
use crate::workflow::WorkflowBackend;

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Longest uninterrupted sleep while backing off.
const BACKOFF_SLICE: Duration = Duration::from_millis(100);

/// Errors that stop the poll loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A per-client worker thread could not be spawned.
    #[error("failed to spawn poll worker for client '{client}': {source}")]
    Spawn {
        /// Client the worker would have served.
        client: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A per-client worker thread panicked.
    #[error("poll worker for client '{client}' panicked")]
    WorkerPanicked {
        /// Client the worker served.
        client: String,
    },
}

/// Cycle counts accumulated over one run of the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    /// Cycles where the long-poll elapsed empty.
    pub idle: u64,
    /// Cycles where a handler ran.
    pub dispatched: u64,
    /// Cycles where the message was rejected before dispatch.
    pub rejected: u64,
    /// Cycles where the receive call failed.
    pub receive_failures: u64,
    /// Handled cycles whose delete call failed.
    pub delete_failures: u64,
}

impl PollSummary {
    /// Cycles that received a message.
    #[must_use]
    pub fn handled(&self) -> u64 {
        self.dispatched + self.rejected
    }

    /// All cycles run.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.idle + self.handled() + self.receive_failures
    }
}

#[derive(Debug, Default)]
struct PollCounters {
    idle: AtomicU64,
    dispatched: AtomicU64,
    rejected: AtomicU64,
    receive_failures: AtomicU64,
    delete_failures: AtomicU64,
}

impl PollCounters {
    fn record(&self, outcome: &CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Idle => &self.idle,
            CycleOutcome::ReceiveFailed(_) => &self.receive_failures,
            CycleOutcome::Handled {
                disposition,
                deletion,
            } => {
                if deletion.is_err() {
                    self.delete_failures.fetch_add(1, Ordering::Relaxed);
                }
                match disposition {
                    Disposition::Dispatched { .. } => &self.dispatched,
                    Disposition::Rejected(_) => &self.rejected,
                }
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self) -> PollSummary {
        PollSummary {
            idle: self.idle.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            receive_failures: self.receive_failures.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
        }
    }
}

/// Drives [`MessageDispatcher::poll_until`] until shutdown.
pub struct PollLoop<'a, T, B> {
    dispatcher: &'a MessageDispatcher<T, B>,
    clients: &'a [ClientBinding],
    mode: PollMode,
    reporter: &'a dyn HealthReporter,
    counters: PollCounters,
    aborted: AtomicBool,
}

impl<'a, T, B> PollLoop<'a, T, B>
where
    T: QueueTransport,
    B: WorkflowBackend,
{
    /// Builds a loop over `clients`.
    pub fn new(
        dispatcher: &'a MessageDispatcher<T, B>,
        clients: &'a [ClientBinding],
        mode: PollMode,
        reporter: &'a dyn HealthReporter,
    ) -> Self {
        Self {
            dispatcher,
            clients,
            mode,
            reporter,
            counters: PollCounters::default(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Runs cycles until `shutdown` reports a request.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when a per-client worker cannot be started or
    /// panics. Workers that did start are stopped before returning.
    pub fn run(&self, shutdown: &dyn ShutdownSignal) -> Result<PollSummary, RuntimeError> {
        info!(
            target: RUNTIME_TARGET,
            mode = %self.mode,
            clients = self.clients.len(),
            "poll loop starting"
        );
        let result = match self.mode {
            PollMode::Sequential => {
                self.poll_clients(self.clients, shutdown);
                Ok(())
            }
            PollMode::PerClient => self.run_per_client(shutdown),
        };
        let summary = self.counters.summary();
        info!(
            target: RUNTIME_TARGET,
            cycles = summary.cycles(),
            dispatched = summary.dispatched,
            rejected = summary.rejected,
            receive_failures = summary.receive_failures,
            delete_failures = summary.delete_failures,
            "poll loop stopped"
        );
        result.map(|()| summary)
    }

    fn run_per_client(&self, shutdown: &dyn ShutdownSignal) -> Result<(), RuntimeError> {
        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(self.clients.len());
            for client in self.clients {
                let spawned = thread::Builder::new()
                    .name(format!("poll-{}", client.name()))
                    .spawn_scoped(scope, move || {
                        let _sentinel = PanicSentinel {
                            aborted: &self.aborted,
                            client,
                        };
                        self.poll_clients(std::slice::from_ref(client), shutdown);
                    });
                match spawned {
                    Ok(handle) => workers.push((client, handle)),
                    Err(source) => {
                        self.aborted.store(true, Ordering::SeqCst);
                        return Err(RuntimeError::Spawn {
                            client: client.name().to_owned(),
                            source,
                        });
                    }
                }
            }

            let mut result = Ok(());
            for (client, handle) in workers {
                if handle.join().is_err() && result.is_ok() {
                    self.aborted.store(true, Ordering::SeqCst);
                    result = Err(RuntimeError::WorkerPanicked {
                        client: client.name().to_owned(),
                    });
                }
            }
            result
        })
    }

    fn poll_clients(&self, clients: &[ClientBinding], shutdown: &dyn ShutdownSignal) {
        if clients.is_empty() {
            return;
        }
        loop {
            for client in clients {
                if self.should_stop(shutdown) {
                    return;
                }
                let stop = StopCheck {
                    aborted: &self.aborted,
                    shutdown,
                };
                let outcome = self.dispatcher.poll_until(client, &stop);
                self.counters.record(&outcome);
                self.reporter.cycle_completed(client, &outcome);
                if matches!(outcome, CycleOutcome::ReceiveFailed(_)) {
                    self.back_off(client, shutdown);
                }
            }
        }
    }

    fn should_stop(&self, shutdown: &dyn ShutdownSignal) -> bool {
        self.aborted.load(Ordering::SeqCst) || shutdown.requested()
    }

    fn back_off(&self, client: &ClientBinding, shutdown: &dyn ShutdownSignal) {
        let delay = self.dispatcher.settings().receive_failure_backoff;
        if delay.is_zero() {
            return;
        }
        warn!(
            target: RUNTIME_TARGET,
            client = client.name(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "backing off after receive failure"
        );
        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.should_stop(shutdown) {
                debug!(target: RUNTIME_TARGET, client = client.name(), "backoff finished");
                return;
            }
            thread::sleep(remaining.min(BACKOFF_SLICE));
        }
    }
}

/// Shutdown as seen by one worker: a signal or a sibling's abort.
struct StopCheck<'a> {
    aborted: &'a AtomicBool,
    shutdown: &'a dyn ShutdownSignal,
}

impl ShutdownSignal for StopCheck<'_> {
    fn requested(&self) -> bool {
        self.aborted.load(Ordering::SeqCst) || self.shutdown.requested()
    }
}

/// Raises the abort flag if dropped while its worker is unwinding.
struct PanicSentinel<'a> {
    aborted: &'a AtomicBool,
    client: &'a ClientBinding,
}

impl Drop for PanicSentinel<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.aborted.store(true, Ordering::SeqCst);
            error!(
                target: RUNTIME_TARGET,
                client = self.client.name(),
                "poll worker panicked; stopping remaining workers"
            );
        }
    }
}

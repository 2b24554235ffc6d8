//! Test double for [`HealthReporter`] that records structured events for assertions.
//!
//! The recorder can also act as the shutdown signal: once a configured number
//! of cycles has completed it requests shutdown, which lets scenarios run the
//! real poll loop to completion.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use inputpoller_config::{ClientBinding, Config};

use crate::backends::{BackendKind, BackendStartupError};
use crate::bootstrap::BootstrapError;
use crate::dispatch::CycleOutcome;
use crate::health::HealthReporter;
use crate::process::ShutdownSignal;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded { clients: Vec<String> },
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// Backend connection initiated.
    BackendStarting(BackendKind),
    /// Backend connected successfully.
    BackendReady(BackendKind),
    /// Backend failed to connect with a message.
    BackendFailed { kind: BackendKind, message: String },
    /// Poll loop started.
    PollerRunning(usize),
    /// One cycle finished.
    CycleCompleted { client: String, outcome: String },
    /// Poll loop returned.
    PollerStopped,
}

#[derive(Debug, Default)]
enum StopRule {
    #[default]
    Never,
    Total(u64),
    EachClient { clients: Vec<String>, cycles: u64 },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
    rule: StopRule,
    cycles: Mutex<HashMap<String, u64>>,
    stop: AtomicBool,
}

impl RecordingHealthReporter {
    /// Reporter that requests shutdown after `cycles` completed cycles.
    #[must_use]
    pub fn stopping_after(cycles: u64) -> Self {
        Self {
            rule: StopRule::Total(cycles),
            ..Self::default()
        }
    }

    /// Reporter that requests shutdown once every named client has completed
    /// at least `cycles` cycles.
    #[must_use]
    pub fn stopping_after_each(clients: &[&str], cycles: u64) -> Self {
        Self {
            rule: StopRule::EachClient {
                clients: clients.iter().map(|client| (*client).to_owned()).collect(),
                cycles,
            },
            ..Self::default()
        }
    }

    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Outcome labels of completed cycles, in order.
    #[must_use]
    pub fn cycle_outcomes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::CycleCompleted { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, clients: &[ClientBinding]) {
        self.record(HealthEvent::BootstrapSucceeded {
            clients: clients.iter().map(|client| client.name().to_owned()).collect(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn backend_starting(&self, kind: BackendKind) {
        self.record(HealthEvent::BackendStarting(kind));
    }

    fn backend_ready(&self, kind: BackendKind) {
        self.record(HealthEvent::BackendReady(kind));
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        self.record(HealthEvent::BackendFailed {
            kind: error.kind,
            message: error.message().to_owned(),
        });
    }

    fn poller_running(&self, clients: usize) {
        self.record(HealthEvent::PollerRunning(clients));
    }

    fn cycle_completed(&self, client: &ClientBinding, outcome: &CycleOutcome) {
        self.record(HealthEvent::CycleCompleted {
            client: client.name().to_owned(),
            outcome: outcome.label().to_owned(),
        });
        let mut counts = self.cycles.lock().expect("cycle counts mutex poisoned");
        *counts.entry(client.name().to_owned()).or_default() += 1;
        let done = match &self.rule {
            StopRule::Never => false,
            StopRule::Total(limit) => counts.values().sum::<u64>() >= *limit,
            StopRule::EachClient { clients, cycles } => clients
                .iter()
                .all(|name| counts.get(name).copied().unwrap_or_default() >= *cycles),
        };
        if done {
            self.stop.store(true, Ordering::SeqCst);
        }
    }

    fn poller_stopped(&self) {
        self.record(HealthEvent::PollerStopped);
    }
}

impl ShutdownSignal for RecordingHealthReporter {
    fn requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

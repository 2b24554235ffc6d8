//! In-process queue transport.
//!
//! Mirrors the SQS visibility model closely enough for the poll loop: a
//! received message moves to an in-flight set under a fresh receipt handle
//! and leaves the queue only when deleted. Receives block on a condition
//! variable for up to the requested wait, so long-poll timing is exercised
//! without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use inputpoller_config::QueueLocator;

use super::{InboundMessage, QueueTransport, ReceiptHandle, TransportError};

/// Thread-safe in-memory implementation of [`QueueTransport`].
#[derive(Debug, Default)]
pub struct MemoryQueueTransport {
    state: Mutex<MemoryState>,
    arrivals: Condvar,
}

#[derive(Debug, Default)]
struct MemoryState {
    queues: HashMap<QueueLocator, QueueState>,
    next_receipt: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Vec<u8>>,
    in_flight: HashMap<ReceiptHandle, Vec<u8>>,
    deletions: Vec<ReceiptHandle>,
    receives: usize,
}

impl MemoryQueueTransport {
    /// Creates a transport with no queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an empty queue. Receiving from an undeclared queue fails.
    pub fn create_queue(&self, queue: &QueueLocator) {
        if let Ok(mut state) = self.lock() {
            state.queues.entry(queue.clone()).or_default();
        }
    }

    /// Enqueues a message body, declaring the queue if needed.
    pub fn send(&self, queue: &QueueLocator, body: impl Into<Vec<u8>>) {
        if let Ok(mut state) = self.lock() {
            state
                .queues
                .entry(queue.clone())
                .or_default()
                .pending
                .push_back(body.into());
        }
        self.arrivals.notify_all();
    }

    /// Number of messages waiting to be received.
    #[must_use]
    pub fn pending(&self, queue: &QueueLocator) -> usize {
        self.inspect(queue, |queue| queue.pending.len())
    }

    /// Number of received messages that have not been deleted.
    #[must_use]
    pub fn in_flight(&self, queue: &QueueLocator) -> usize {
        self.inspect(queue, |queue| queue.in_flight.len())
    }

    /// Receipt handles passed to `delete`, in call order.
    #[must_use]
    pub fn deletions(&self, queue: &QueueLocator) -> Vec<ReceiptHandle> {
        self.inspect(queue, |queue| queue.deletions.clone())
    }

    /// Number of receive calls made against the queue.
    #[must_use]
    pub fn receives(&self, queue: &QueueLocator) -> usize {
        self.inspect(queue, |queue| queue.receives)
    }

    fn inspect<R: Default>(&self, queue: &QueueLocator, read: impl FnOnce(&QueueState) -> R) -> R {
        self.lock()
            .ok()
            .and_then(|state| state.queues.get(queue).map(read))
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, TransportError> {
        self.state
            .lock()
            .map_err(|_| TransportError::receive("memory", "queue state lock poisoned"))
    }
}

impl QueueTransport for MemoryQueueTransport {
    fn receive(
        &self,
        queue: &QueueLocator,
        wait: Duration,
    ) -> Result<Option<InboundMessage>, TransportError> {
        // `None` when the wait runs past what `Instant` can represent.
        let deadline = Instant::now().checked_add(wait);
        let mut state = self.lock()?;
        match state.queues.get_mut(queue) {
            Some(entry) => entry.receives += 1,
            None => return Err(TransportError::receive(queue.as_str(), "queue does not exist")),
        }

        loop {
            let receipt = ReceiptHandle::new(format!("{queue}#{}", state.next_receipt));
            let entry = state
                .queues
                .get_mut(queue)
                .ok_or_else(|| TransportError::receive(queue.as_str(), "queue does not exist"))?;
            if let Some(body) = entry.pending.pop_front() {
                entry.in_flight.insert(receipt.clone(), body.clone());
                state.next_receipt += 1;
                return Ok(Some(InboundMessage::new(body, receipt)));
            }

            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                    self.arrivals
                        .wait_timeout(state, remaining)
                        .map_err(|_| poisoned(queue))?
                        .0
                }
                None => self.arrivals.wait(state).map_err(|_| poisoned(queue))?,
            };
        }
    }

    fn delete(&self, queue: &QueueLocator, receipt: &ReceiptHandle) -> Result<(), TransportError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransportError::delete(queue.as_str(), "queue state lock poisoned"))?;
        let entry = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::delete(queue.as_str(), "queue does not exist"))?;
        entry.in_flight.remove(receipt);
        entry.deletions.push(receipt.clone());
        Ok(())
    }
}

fn poisoned(queue: &QueueLocator) -> TransportError {
    TransportError::receive(queue.as_str(), "queue state lock poisoned")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn queue() -> QueueLocator {
        QueueLocator::new("memory://acme-input")
    }

    #[rstest]
    fn receive_moves_message_in_flight_until_deleted(queue: QueueLocator) {
        let transport = MemoryQueueTransport::new();
        transport.send(&queue, "payload");

        let message = transport
            .receive(&queue, Duration::ZERO)
            .expect("receive")
            .expect("message");
        assert_eq!(message.body(), b"payload");
        assert_eq!(transport.pending(&queue), 0);
        assert_eq!(transport.in_flight(&queue), 1);

        transport
            .delete(&queue, message.receipt_handle())
            .expect("delete");
        assert_eq!(transport.in_flight(&queue), 0);
        assert_eq!(transport.deletions(&queue), vec![message.receipt_handle().clone()]);
    }

    #[rstest]
    fn empty_queue_returns_none_after_wait(queue: QueueLocator) {
        let transport = MemoryQueueTransport::new();
        transport.create_queue(&queue);

        let started = Instant::now();
        let received = transport
            .receive(&queue, Duration::from_millis(20))
            .expect("receive");
        assert!(received.is_none());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[rstest]
    fn receive_wakes_when_message_arrives(queue: QueueLocator) {
        let transport = Arc::new(MemoryQueueTransport::new());
        transport.create_queue(&queue);

        let sender = Arc::clone(&transport);
        let target = queue.clone();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sender.send(&target, "late");
        });

        let message = transport
            .receive(&queue, Duration::from_secs(5))
            .expect("receive")
            .expect("message should arrive before the wait elapses");
        assert_eq!(message.body(), b"late");
        producer.join().expect("producer thread");
    }

    #[rstest]
    fn unbounded_wait_returns_pending_message(queue: QueueLocator) {
        let transport = MemoryQueueTransport::new();
        transport.send(&queue, "payload");

        let message = transport
            .receive(&queue, Duration::MAX)
            .expect("receive")
            .expect("message");
        assert_eq!(message.body(), b"payload");
        assert_eq!(transport.receives(&queue), 1);
    }

    #[rstest]
    fn unbounded_wait_wakes_on_arrival(queue: QueueLocator) {
        let transport = Arc::new(MemoryQueueTransport::new());
        transport.create_queue(&queue);

        let sender = Arc::clone(&transport);
        let target = queue.clone();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sender.send(&target, "late");
        });

        let message = transport
            .receive(&queue, Duration::MAX)
            .expect("receive")
            .expect("message");
        assert_eq!(message.body(), b"late");
        producer.join().expect("producer thread");
    }

    #[rstest]
    fn undeclared_queue_fails_receive(queue: QueueLocator) {
        let transport = MemoryQueueTransport::new();
        let error = transport
            .receive(&queue, Duration::ZERO)
            .expect_err("undeclared queue");
        assert!(matches!(error, TransportError::Receive { .. }));
    }

    #[rstest]
    fn delete_is_idempotent(queue: QueueLocator) {
        let transport = MemoryQueueTransport::new();
        transport.send(&queue, "payload");
        let message = transport
            .receive(&queue, Duration::ZERO)
            .expect("receive")
            .expect("message");

        transport
            .delete(&queue, message.receipt_handle())
            .expect("first delete");
        transport
            .delete(&queue, message.receipt_handle())
            .expect("second delete");
        assert_eq!(transport.in_flight(&queue), 0);
    }
}

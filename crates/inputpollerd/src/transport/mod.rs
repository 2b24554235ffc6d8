//! Queue transport consumed by the poll loop.
//!
//! The dispatcher only needs two primitives: a bounded long-poll receive and
//! an idempotent delete keyed by the receipt handle returned from the
//! receive. [`QueueTransport`] captures that contract so the poll loop can run
//! against SQS in production and an in-process queue in tests.

mod errors;
mod memory;
#[cfg(feature = "aws")]
mod sqs;

use std::fmt;
use std::time::Duration;

use inputpoller_config::QueueLocator;

pub use self::errors::TransportError;
pub use self::memory::MemoryQueueTransport;
#[cfg(feature = "aws")]
pub use self::sqs::SqsQueueTransport;

/// Opaque token that identifies one delivery of a message for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    /// Wraps a transport-issued receipt token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A message returned by a receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    body: Vec<u8>,
    receipt_handle: ReceiptHandle,
}

impl InboundMessage {
    /// Builds a message from its raw body and receipt handle.
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>, receipt_handle: ReceiptHandle) -> Self {
        Self {
            body: body.into(),
            receipt_handle,
        }
    }

    /// Raw message body as delivered.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Token used to delete this delivery.
    #[must_use]
    pub fn receipt_handle(&self) -> &ReceiptHandle {
        &self.receipt_handle
    }
}

/// Receive/delete primitives over client input queues.
///
/// Implementations are shared between poll workers, so they must be `Sync`.
pub trait QueueTransport: Send + Sync {
    /// Waits up to `wait` for a message on `queue`.
    ///
    /// Returns `Ok(None)` when the wait elapses without a message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the transport itself fails.
    fn receive(
        &self,
        queue: &QueueLocator,
        wait: Duration,
    ) -> Result<Option<InboundMessage>, TransportError>;

    /// Removes a delivered message. Deleting an already deleted message is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the transport rejects the call.
    fn delete(&self, queue: &QueueLocator, receipt: &ReceiptHandle) -> Result<(), TransportError>;
}

impl<T> QueueTransport for std::sync::Arc<T>
where
    T: QueueTransport + ?Sized,
{
    fn receive(
        &self,
        queue: &QueueLocator,
        wait: Duration,
    ) -> Result<Option<InboundMessage>, TransportError> {
        (**self).receive(queue, wait)
    }

    fn delete(&self, queue: &QueueLocator, receipt: &ReceiptHandle) -> Result<(), TransportError> {
        (**self).delete(queue, receipt)
    }
}

//! Error types for queue transport operations.

use thiserror::Error;

/// Failure of a receive or delete call itself (as opposed to an empty
/// receive).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The receive call failed.
    #[error("failed to receive from queue '{queue}': {message}")]
    Receive {
        /// Queue that was polled.
        queue: String,
        /// Transport-provided description.
        message: String,
        /// Underlying client error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The delete call failed.
    #[error("failed to delete message from queue '{queue}': {message}")]
    Delete {
        /// Queue holding the message.
        queue: String,
        /// Transport-provided description.
        message: String,
        /// Underlying client error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The transport returned a message it could not describe fully.
    #[error("queue '{queue}' returned an unusable message: {message}")]
    MalformedDelivery {
        /// Queue that returned the message.
        queue: String,
        /// What was missing or wrong.
        message: String,
    },
}

impl TransportError {
    /// Creates a receive failure without an underlying source.
    pub fn receive(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Receive {
            queue: queue.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a receive failure wrapping a client error.
    pub fn receive_with_source(
        queue: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Receive {
            queue: queue.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a delete failure without an underlying source.
    pub fn delete(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delete {
            queue: queue.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a delete failure wrapping a client error.
    pub fn delete_with_source(
        queue: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Delete {
            queue: queue.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an error for a delivery lacking a body or receipt handle.
    pub fn malformed_delivery(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDelivery {
            queue: queue.into(),
            message: message.into(),
        }
    }
}

//! SQS implementation of [`QueueTransport`].

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use tokio::runtime::Runtime;

use inputpoller_config::QueueLocator;

use super::{InboundMessage, QueueTransport, ReceiptHandle, TransportError};

/// Longest long-poll wait SQS accepts.
const MAX_WAIT_SECONDS: u64 = 20;

/// Queue transport over SQS `ReceiveMessage` and `DeleteMessage`.
#[derive(Debug, Clone)]
pub struct SqsQueueTransport {
    client: Client,
    runtime: Arc<Runtime>,
}

impl SqsQueueTransport {
    /// Wraps an SQS client and the runtime used to drive it.
    #[must_use]
    pub fn new(client: Client, runtime: Arc<Runtime>) -> Self {
        Self { client, runtime }
    }
}

fn wait_seconds(wait: Duration) -> i32 {
    let seconds = wait.as_secs().min(MAX_WAIT_SECONDS);
    i32::try_from(seconds).unwrap_or(0)
}

impl QueueTransport for SqsQueueTransport {
    fn receive(
        &self,
        queue: &QueueLocator,
        wait: Duration,
    ) -> Result<Option<InboundMessage>, TransportError> {
        let request = self
            .client
            .receive_message()
            .queue_url(queue.as_str())
            .max_number_of_messages(1)
            .wait_time_seconds(wait_seconds(wait))
            .send();
        let output = self.runtime.block_on(request).map_err(|error| {
            TransportError::receive_with_source(
                queue.as_str(),
                DisplayErrorContext(&error).to_string(),
                error,
            )
        })?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };
        let receipt = message.receipt_handle().ok_or_else(|| {
            TransportError::malformed_delivery(queue.as_str(), "message has no receipt handle")
        })?;
        // A missing body decodes as invalid JSON and is deleted like any other
        // malformed command.
        let body = message.body().unwrap_or_default();
        Ok(Some(InboundMessage::new(
            body.as_bytes().to_vec(),
            ReceiptHandle::new(receipt),
        )))
    }

    fn delete(&self, queue: &QueueLocator, receipt: &ReceiptHandle) -> Result<(), TransportError> {
        let request = self
            .client
            .delete_message()
            .queue_url(queue.as_str())
            .receipt_handle(receipt.as_str())
            .send();
        self.runtime.block_on(request).map(|_| ()).map_err(|error| {
            TransportError::delete_with_source(
                queue.as_str(),
                DisplayErrorContext(&error).to_string(),
                error,
            )
        })
    }
}

//! Queue repository
//!
//! Publishes pipeline messages to SQS queues.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;

use crate::error::{ClientError, Result};

/// Repository trait for queue publishing
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Sends a message body to a queue
    ///
    /// # Returns
    /// The message id assigned by the queue, when the service reports one
    async fn send(&self, queue_url: &str, body: &str) -> Result<Option<String>>;
}

/// SQS implementation of QueuePublisher
#[derive(Debug, Clone)]
pub struct SqsQueuePublisher {
    client: Client,
}

impl SqsQueuePublisher {
    /// Creates a repository from the shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl QueuePublisher for SqsQueuePublisher {
    async fn send(&self, queue_url: &str, body: &str) -> Result<Option<String>> {
        let response = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                ClientError::Queue(format!(
                    "Failed to send message to {}: {}",
                    queue_url,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(response.message_id().map(str::to_string))
    }
}

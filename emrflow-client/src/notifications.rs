//! Notifications repository
//!
//! Publishes operator alerts to SNS topics.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::DisplayErrorContext;

use crate::error::{ClientError, Result};

/// Repository trait for notification publishing
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes a message with a subject line to a topic
    ///
    /// # Returns
    /// The message id assigned by the topic, when the service reports one
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str)
    -> Result<Option<String>>;
}

/// SNS implementation of Notifier
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    /// Creates a repository from the shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<Option<String>> {
        let response = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| {
                ClientError::Notification(format!(
                    "Failed to publish to {}: {}",
                    topic_arn,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(response.message_id().map(str::to_string))
    }
}

//! Outcome routing service
//!
//! Reacts to a step status change event:
//! - Events for other steps are filtered out
//! - `COMPLETED` publishes the downstream trigger message
//! - `FAILED` fetches the step's stderr log and alerts operators
//! - Any other state is ignored
//!
//! Each invocation is terminal; nothing is carried over to the next event.

use async_trait::async_trait;
use emrflow_client::{Notifier, ObjectStore, QueuePublisher};
use emrflow_core::domain::step::{StepLogLocation, StepState};
use emrflow_core::dto::step::StepChangeEvent;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Span, debug, info};

use crate::error::MonitorError;
use crate::service::alert::{FailureAlert, decompress_log};

/// What an outcome invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDisposition {
    /// The event was for a step this handler does not watch
    FilteredOut { name: String },
    /// The downstream trigger was published
    Forwarded { message_id: Option<String> },
    /// The failure alert was published
    Alerted { message_id: Option<String> },
    /// The step is in a state that needs no action
    Ignored { state: StepState },
}

/// Service trait for routing step outcomes
#[async_trait]
pub trait OutcomeService: Send + Sync {
    /// Handles one step status change event
    ///
    /// # Arguments
    /// * `payload` - The raw event delivered by the runtime
    async fn handle(&self, payload: JsonValue) -> Result<StepDisposition, MonitorError>;
}

/// Where outcomes are routed
#[derive(Debug, Clone)]
pub struct RoutingTargets {
    pub step_name: String,
    pub downstream_queue_url: String,
    /// Serialized downstream trigger message
    pub downstream_body: String,
    pub log_bucket: String,
    pub log_prefix: String,
    pub alert_topic_arn: String,
    pub alert_subject: String,
}

/// Standard implementation of OutcomeService
pub struct StandardOutcomeService {
    targets: RoutingTargets,
    objects: Arc<dyn ObjectStore>,
    queue: Arc<dyn QueuePublisher>,
    notifier: Arc<dyn Notifier>,
}

impl StandardOutcomeService {
    /// Creates a new outcome service
    pub fn new(
        targets: RoutingTargets,
        objects: Arc<dyn ObjectStore>,
        queue: Arc<dyn QueuePublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            targets,
            objects,
            queue,
            notifier,
        }
    }

    /// Publishes the downstream trigger message
    async fn forward(&self) -> Result<StepDisposition, MonitorError> {
        info!(
            "The {} step was successful. A message will be sent to the ETL queue.",
            self.targets.step_name
        );

        let message_id = self
            .queue
            .send(
                &self.targets.downstream_queue_url,
                &self.targets.downstream_body,
            )
            .await
            .map_err(MonitorError::Downstream)?;

        info!(
            "Downstream message sent (message id: {})",
            message_id.as_deref().unwrap_or("unknown")
        );
        Ok(StepDisposition::Forwarded { message_id })
    }

    /// Fetches the step's stderr log and publishes the failure alert
    async fn alert(
        &self,
        cluster_id: &str,
        step_id: &str,
    ) -> Result<StepDisposition, MonitorError> {
        info!(
            "The {} step failed. An alert will be sent about the failure.",
            self.targets.step_name
        );

        let location = StepLogLocation::stderr(
            &self.targets.log_bucket,
            &self.targets.log_prefix,
            cluster_id,
            step_id,
        );

        let compressed = self
            .objects
            .get(&location.bucket, &location.key)
            .await
            .map_err(MonitorError::LogFetch)?;

        let log = decompress_log(&compressed).map_err(|source| MonitorError::Decompression {
            uri: location.uri(),
            source,
        })?;
        debug!(
            "Fetched {} ({} compressed bytes, {} bytes of text)",
            location.uri(),
            compressed.len(),
            log.len()
        );

        let alert = FailureAlert::compose(&self.targets.alert_subject, &location, &log);
        let message_id = self
            .notifier
            .publish(&self.targets.alert_topic_arn, &alert.subject, &alert.message)
            .await
            .map_err(MonitorError::Alert)?;

        info!(
            "Failure alert published (message id: {})",
            message_id.as_deref().unwrap_or("unknown")
        );
        Ok(StepDisposition::Alerted { message_id })
    }
}

#[async_trait]
impl OutcomeService for StandardOutcomeService {
    async fn handle(&self, payload: JsonValue) -> Result<StepDisposition, MonitorError> {
        let event = StepChangeEvent::from_value(payload)?;
        let detail = &event.detail;

        let span = Span::current();
        span.record("cluster_id", detail.cluster_id.as_str());
        span.record("step_id", detail.step_id.as_str());

        if detail.name != self.targets.step_name {
            debug!("Ignoring event for step '{}'", detail.name);
            return Ok(StepDisposition::FilteredOut {
                name: detail.name.clone(),
            });
        }

        info!("Logging the step change event: {:?}", event);
        info!(
            "Found a step with name: {} and clusterId: {}",
            detail.name, detail.cluster_id
        );
        if let Some(time) = event.time {
            info!("Step {} changed state at {}", detail.step_id, time.to_rfc3339());
        }

        match event.state() {
            StepState::Completed => self.forward().await,
            StepState::Failed => self.alert(&detail.cluster_id, &detail.step_id).await,
            state => {
                debug!("Step {} is {}, nothing to do", detail.step_id, state);
                Ok(StepDisposition::Ignored { state })
            }
        }
    }
}

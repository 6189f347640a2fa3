//! Monitor configuration
//!
//! Defines where step outcomes are routed: the downstream queue for completed
//! steps and the alert topic for failed ones.

use anyhow::{Context, Result};
use emrflow_core::domain::message::PipelineMessage;
use emrflow_core::domain::policy::ErrorPolicy;

use crate::service::RoutingTargets;

/// Longest subject line the notification service accepts
const MAX_SUBJECT_LEN: usize = 100;

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Step whose events are acted on; events for other steps are ignored
    pub step_name: String,

    /// Queue notified when the step completes
    pub downstream_queue_url: String,

    /// Message sent downstream on completion
    pub downstream_payload: PipelineMessage,

    /// Bucket the cluster ships its logs to
    pub log_bucket: String,

    /// Key prefix of the cluster logs within the bucket
    pub log_prefix: String,

    /// Topic alerted when the step fails
    pub alert_topic_arn: String,

    pub alert_subject: String,

    pub error_policy: ErrorPolicy,
    pub log_level: String,
}

impl Config {
    /// Creates a configuration from the required values, with defaults for
    /// everything else
    pub fn new(downstream_queue_url: String, log_bucket: String, alert_topic_arn: String) -> Self {
        Self {
            step_name: "sampleSparkJob".to_string(),
            downstream_queue_url,
            downstream_payload: PipelineMessage::default_downstream(),
            log_bucket,
            log_prefix: "elasticmapreduce".to_string(),
            alert_topic_arn,
            alert_subject: "Bank Statement Hadoop ETL Failure".to_string(),
            error_policy: ErrorPolicy::default(),
            log_level: "info".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Required environment variables:
    /// - DOWNSTREAM_QUEUE_URL
    /// - LOG_BUCKET
    /// - ALERT_TOPIC_ARN
    ///
    /// Optional: STEP_NAME, DOWNSTREAM_PAYLOAD, LOG_PREFIX, ALERT_SUBJECT,
    /// ERROR_POLICY, LOG_LEVEL
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let mut config = Self::new(
            required("DOWNSTREAM_QUEUE_URL")?,
            required("LOG_BUCKET")?,
            required("ALERT_TOPIC_ARN")?,
        );

        if let Some(name) = lookup("STEP_NAME") {
            config.step_name = name;
        }
        if let Some(raw) = lookup("DOWNSTREAM_PAYLOAD") {
            config.downstream_payload = PipelineMessage::from_json(&raw)
                .context("DOWNSTREAM_PAYLOAD is not a valid payload")?;
        }
        if let Some(prefix) = lookup("LOG_PREFIX") {
            config.log_prefix = prefix;
        }
        if let Some(subject) = lookup("ALERT_SUBJECT") {
            config.alert_subject = subject;
        }
        if let Some(raw) = lookup("ERROR_POLICY") {
            config.error_policy = raw.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.step_name.is_empty() {
            anyhow::bail!("step_name cannot be empty");
        }

        if !self.downstream_queue_url.starts_with("https://") {
            anyhow::bail!("downstream_queue_url must start with https://");
        }

        if self.log_bucket.is_empty() {
            anyhow::bail!("log_bucket cannot be empty");
        }

        if !self.alert_topic_arn.starts_with("arn:") {
            anyhow::bail!("alert_topic_arn must be an ARN");
        }

        if self.alert_subject.is_empty() || self.alert_subject.chars().count() > MAX_SUBJECT_LEN {
            anyhow::bail!(
                "alert_subject must be between 1 and {} characters",
                MAX_SUBJECT_LEN
            );
        }

        Ok(())
    }

    /// Resolves the routing targets used by the outcome service
    pub fn routing_targets(&self) -> Result<RoutingTargets> {
        let downstream_body = self
            .downstream_payload
            .json_body()
            .context("Failed to serialize downstream payload")?;

        Ok(RoutingTargets {
            step_name: self.step_name.clone(),
            downstream_queue_url: self.downstream_queue_url.clone(),
            downstream_body,
            log_bucket: self.log_bucket.clone(),
            log_prefix: self.log_prefix.clone(),
            alert_topic_arn: self.alert_topic_arn.clone(),
            alert_subject: self.alert_subject.clone(),
        })
    }
}

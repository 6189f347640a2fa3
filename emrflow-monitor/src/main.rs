//! emrflow Monitor
//!
//! Lambda handler that reacts to EMR step status change events. A completed
//! step triggers the next pipeline stage through the downstream queue; a
//! failed step sends its stderr log to operators through the alert topic.
//!
//! Architecture:
//! - Configuration: routing targets loaded from the environment at cold start
//! - Repositories: AWS SDK clients from `emrflow-client` (S3, SQS, SNS)
//! - Services: outcome routing, log decompression, alert composition
//! - Adapter: this file; runs each invocation in its own span and applies the
//!   configured error policy to the service result

mod config;
mod error;
mod service;

use anyhow::{Context, Result};
use emrflow_client::{S3ObjectStore, SnsNotifier, SqsQueuePublisher, load_sdk_config};
use emrflow_core::domain::policy::ErrorPolicy;
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Instrument, error, field, info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::MonitorError;
use crate::service::{OutcomeService, StandardOutcomeService, StepDisposition};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let config = load_config()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "emrflow_monitor={level},emrflow_client={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false).without_time())
        .init();

    info!(
        "Loaded configuration: step={}, log_bucket={}, error_policy={}",
        config.step_name, config.log_bucket, config.error_policy
    );

    // Initialize services
    let sdk_config = load_sdk_config().await;
    let service: Arc<dyn OutcomeService> = Arc::new(StandardOutcomeService::new(
        config.routing_targets()?,
        Arc::new(S3ObjectStore::new(&sdk_config)),
        Arc::new(SqsQueuePublisher::new(&sdk_config)),
        Arc::new(SnsNotifier::new(&sdk_config)),
    ));
    let policy = config.error_policy;

    info!("Monitor initialized");

    let service = &service;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<JsonValue>| async move {
        handle_event(service.as_ref(), policy, event).await
    }))
    .await
}

/// Loads and validates configuration from the environment
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load monitor configuration")?;
    config.validate()?;
    Ok(config)
}

/// Runs one invocation inside a span carrying the request id
async fn handle_event(
    service: &dyn OutcomeService,
    policy: ErrorPolicy,
    event: LambdaEvent<JsonValue>,
) -> Result<(), lambda_runtime::Error> {
    let LambdaEvent { payload, context } = event;
    let span = info_span!(
        "step_outcome",
        request_id = %context.request_id,
        cluster_id = field::Empty,
        step_id = field::Empty
    );

    let result = service.handle(payload).instrument(span.clone()).await;
    span.in_scope(|| settle(result, policy))
}

/// Logs the outcome and decides what the runtime sees
fn settle(
    result: Result<StepDisposition, MonitorError>,
    policy: ErrorPolicy,
) -> Result<(), lambda_runtime::Error> {
    match result {
        Ok(disposition) => {
            info!("Step event handled: {:?}", disposition);
            Ok(())
        }
        Err(e) => {
            error!("Something went wrong: {}", e);
            match policy {
                ErrorPolicy::Suppress => Ok(()),
                ErrorPolicy::Propagate => Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emrflow_client::ClientError;

    #[test]
    fn test_settle_suppresses_errors_by_default() {
        let result = Err(MonitorError::LogFetch(ClientError::ObjectStore(
            "NoSuchKey".into(),
        )));
        assert!(settle(result, ErrorPolicy::default()).is_ok());
    }

    #[test]
    fn test_settle_propagates_when_configured() {
        let result = Err(MonitorError::Downstream(ClientError::Queue(
            "NonExistentQueue".into(),
        )));
        let err = settle(result, ErrorPolicy::Propagate).unwrap_err();
        assert!(err.to_string().contains("NonExistentQueue"));
    }

    #[test]
    fn test_settle_dispositions_are_success() {
        let disposition = StepDisposition::FilteredOut {
            name: "otherJob".into(),
        };
        assert!(settle(Ok(disposition), ErrorPolicy::Propagate).is_ok());
    }
}

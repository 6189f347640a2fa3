//! emrflow Launcher
//!
//! Lambda handler that launches the Spark ETL job on EMR when the trigger
//! message arrives on the inbound queue.
//!
//! Architecture:
//! - Configuration: resource identifiers loaded from the environment at cold start
//! - Repositories: AWS SDK clients from `emrflow-client` (S3, EMR)
//! - Services: trigger matching, output cleanup, job submission
//! - Adapter: this file; runs each invocation in its own span and applies the
//!   configured error policy to the service result

mod config;
mod error;
mod service;

use anyhow::{Context, Result};
use emrflow_client::{EmrClusterService, S3ObjectStore, load_sdk_config};
use emrflow_core::domain::policy::ErrorPolicy;
use emrflow_core::validation::TriggerValidator;
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Instrument, error, field, info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::LaunchError;
use crate::service::{LaunchOutcome, LaunchService, OutputCleaner, StandardLaunchService};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let config = load_config()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "emrflow_launcher={level},emrflow_client={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false).without_time())
        .init();

    info!(
        "Loaded configuration: job={}, output={}, match={}, error_policy={}",
        config.job_name,
        config.output_uri(),
        config.match_mode,
        config.error_policy
    );

    // Initialize services
    let sdk_config = load_sdk_config().await;
    let service: Arc<dyn LaunchService> = Arc::new(build_service(&config, &sdk_config)?);
    let policy = config.error_policy;

    info!("Launcher initialized");

    let service = &service;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<JsonValue>| async move {
        handle_event(service.as_ref(), policy, event).await
    }))
    .await
}

/// Loads and validates configuration from the environment
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load launcher configuration")?;
    config.validate()?;
    Ok(config)
}

fn build_service(
    config: &Config,
    sdk_config: &emrflow_client::SdkConfig,
) -> Result<StandardLaunchService> {
    let validator = TriggerValidator::new(config.trigger_payload.clone(), config.match_mode);

    let cleaner = OutputCleaner::new(
        Arc::new(S3ObjectStore::new(sdk_config)),
        config.output_bucket.clone(),
        config.output_prefix.clone(),
    );

    Ok(StandardLaunchService::new(
        validator,
        cleaner,
        Arc::new(EmrClusterService::new(sdk_config)),
        config.job_definition(),
    ))
}

/// Runs one invocation inside a span carrying the request id
async fn handle_event(
    service: &dyn LaunchService,
    policy: ErrorPolicy,
    event: LambdaEvent<JsonValue>,
) -> Result<(), lambda_runtime::Error> {
    let LambdaEvent { payload, context } = event;
    let span = info_span!(
        "launch",
        request_id = %context.request_id,
        message_id = field::Empty
    );

    let result = service.handle(payload).instrument(span.clone()).await;
    span.in_scope(|| settle(result, policy))
}

/// Logs the outcome and decides what the runtime sees
fn settle(
    result: Result<LaunchOutcome, LaunchError>,
    policy: ErrorPolicy,
) -> Result<(), lambda_runtime::Error> {
    match result {
        Ok(LaunchOutcome::Launched {
            job_flow_id,
            purged_objects,
        }) => {
            info!(
                "Launch complete: job flow {} (purged {} object(s))",
                job_flow_id, purged_objects
            );
            Ok(())
        }
        Ok(LaunchOutcome::Skipped(rejection)) => {
            info!("No launch: {}", rejection);
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

//! Launcher error types

use emrflow_client::ClientError;
use emrflow_core::EventError;
use thiserror::Error;

/// Errors that stop a launch
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Malformed queue event: {0}")]
    MalformedEvent(#[from] EventError),

    #[error("Output cleanup failed: {0}")]
    Cleanup(#[source] ClientError),

    #[error("Job submission failed: {0}")]
    Submission(#[source] ClientError),
}

//! Monitor error types

use emrflow_client::ClientError;
use emrflow_core::EventError;
use thiserror::Error;

/// Errors that stop outcome routing
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Malformed step change event: {0}")]
    MalformedEvent(#[from] EventError),

    #[error("Failed to publish downstream message: {0}")]
    Downstream(#[source] ClientError),

    #[error("Failed to fetch step log: {0}")]
    LogFetch(#[source] ClientError),

    #[error("Failed to decompress step log {uri}: {source}")]
    Decompression {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to publish failure alert: {0}")]
    Alert(#[source] ClientError),
}

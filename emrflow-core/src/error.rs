//! Error types for inbound events

use thiserror::Error;

/// Errors raised when an inbound event does not have the expected shape
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload could not be deserialized into the expected structure
    #[error("event payload does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    /// A queue event arrived without any records
    #[error("queue event carries no records")]
    NoRecords,
}

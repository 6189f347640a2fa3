//! Queue event DTOs

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Batch of queue messages delivered to the launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

/// A single queue message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub body: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl QueueEvent {
    /// Parses a queue event from the raw invocation payload
    pub fn from_value(value: serde_json::Value) -> Result<Self, EventError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The record the launcher acts on
    ///
    /// Only the first record of a batch is considered.
    pub fn first_record(&self) -> Result<&QueueRecord, EventError> {
        self.records.first().ok_or(EventError::NoRecords)
    }
}

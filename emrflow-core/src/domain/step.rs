//! Step domain types

use std::fmt;

/// State of a cluster step as reported by step status change events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    Pending,
    CancelPending,
    Running,
    Completed,
    Cancelled,
    Failed,
    Interrupted,
    /// A state this crate does not know about, kept verbatim
    Other(String),
}

impl StepState {
    /// Parses the state string carried by the event
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => StepState::Pending,
            "CANCEL_PENDING" => StepState::CancelPending,
            "RUNNING" => StepState::Running,
            "COMPLETED" => StepState::Completed,
            "CANCELLED" => StepState::Cancelled,
            "FAILED" => StepState::Failed,
            "INTERRUPTED" => StepState::Interrupted,
            other => StepState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepState::Pending => "PENDING",
            StepState::CancelPending => "CANCEL_PENDING",
            StepState::Running => "RUNNING",
            StepState::Completed => "COMPLETED",
            StepState::Cancelled => "CANCELLED",
            StepState::Failed => "FAILED",
            StepState::Interrupted => "INTERRUPTED",
            StepState::Other(raw) => raw,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location of a step's compressed stderr log in the cluster log bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLogLocation {
    pub bucket: String,
    pub key: String,
}

impl StepLogLocation {
    /// Derives the stderr location for a step
    ///
    /// The key follows the layout EMR uses when shipping step logs:
    /// `{prefix}/{cluster_id}/steps/{step_id}/stderr.gz`.
    pub fn stderr(bucket: &str, prefix: &str, cluster_id: &str, step_id: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            bucket: bucket.to_string(),
            key: format!("{}/{}/steps/{}/stderr.gz", prefix, cluster_id, step_id),
        }
    }

    /// The `s3://` URI of the log
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

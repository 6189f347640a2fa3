//! Error types for the AWS repositories

use thiserror::Error;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling the managed services
#[derive(Debug, Error)]
pub enum ClientError {
    /// Object store request failed
    #[error("Object store request failed: {0}")]
    ObjectStore(String),

    /// Cluster service request failed
    #[error("Cluster request failed: {0}")]
    Cluster(String),

    /// Queue request failed
    #[error("Queue request failed: {0}")]
    Queue(String),

    /// Notification request failed
    #[error("Notification request failed: {0}")]
    Notification(String),

    /// The service answered without a field the caller relies on
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::Queue("access denied".into());
        assert_eq!(err.to_string(), "Queue request failed: access denied");
    }
}

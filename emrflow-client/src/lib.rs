//! emrflow AWS Client
//!
//! Repositories for the managed services the ETL handlers talk to:
//! - Object store (S3): list, delete and read objects
//! - Cluster service (EMR): submit job flows
//! - Queue (SQS): publish pipeline messages
//! - Notifications (SNS): publish operator alerts
//!
//! Each repository is a trait with an AWS SDK implementation, so handler
//! logic can be exercised against in-memory implementations in tests.
//!
//! # Example
//!
//! ```no_run
//! use emrflow_client::{ObjectStore, S3ObjectStore, load_sdk_config};
//!
//! #[tokio::main]
//! async fn main() -> emrflow_client::Result<()> {
//!     let sdk_config = load_sdk_config().await;
//!     let store = S3ObjectStore::new(&sdk_config);
//!
//!     let keys = store.list_keys("my-bucket", "data/outputData/").await?;
//!     println!("{} objects under prefix", keys.len());
//!     Ok(())
//! }
//! ```

mod cluster;
pub mod error;
mod notifications;
mod objects;
mod queue;

pub use cluster::{ClusterService, EmrClusterService};
pub use error::{ClientError, Result};
pub use notifications::{Notifier, SnsNotifier};
pub use objects::{ObjectStore, S3ObjectStore, s3_uri};
pub use queue::{QueuePublisher, SqsQueuePublisher};

/// Re-exported so binaries do not need a direct `aws-config` dependency
pub use aws_config::SdkConfig;

/// Loads the shared AWS configuration from the standard provider chain
///
/// Region and credentials come from the environment the handler runs in.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

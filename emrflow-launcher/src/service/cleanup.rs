//! Output cleanup service
//!
//! Empties the job's output prefix before a new run so results from an
//! earlier run never mix with the new ones. Objects are deleted one call at a
//! time, in listing order; a failure midway leaves the prefix partially
//! cleaned.

use emrflow_client::{ObjectStore, Result, s3_uri};
use std::sync::Arc;
use tracing::info;

/// Purges the output prefix of the job
pub struct OutputCleaner {
    objects: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl OutputCleaner {
    /// Creates a cleaner for a bucket prefix
    ///
    /// # Arguments
    /// * `objects` - Object store repository
    /// * `bucket` - Output bucket
    /// * `prefix` - Output prefix (e.g., "data/outputData/")
    pub fn new(objects: Arc<dyn ObjectStore>, bucket: String, prefix: String) -> Self {
        Self {
            objects,
            bucket,
            prefix,
        }
    }

    /// Deletes every object under the prefix
    ///
    /// # Returns
    /// The number of objects deleted
    pub async fn purge(&self) -> Result<usize> {
        let location = s3_uri(&self.bucket, &self.prefix);
        let keys = self.objects.list_keys(&self.bucket, &self.prefix).await?;

        if keys.is_empty() {
            info!("{} directory is empty.", location);
            return Ok(0);
        }

        info!(
            "Deleting {} object(s) from {} prior to running the spark job: {:?}",
            keys.len(),
            location,
            keys
        );

        for key in &keys {
            info!("Deleting: {}", key);
            self.objects.delete(&self.bucket, key).await?;
        }

        Ok(keys.len())
    }
}

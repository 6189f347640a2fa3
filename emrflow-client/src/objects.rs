//! Object store repository
//!
//! Handles S3 operations used by the handlers:
//! - Listing keys under a prefix
//! - Deleting single objects
//! - Reading whole objects into memory

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Repository trait for object store operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists every key under a prefix, following pagination to the end
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `prefix` - Key prefix (e.g., "data/outputData/")
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Deletes a single object
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Reads an object's full body
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// S3 implementation of ObjectStore
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Creates a repository from the shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    ClientError::ObjectStore(format!(
                        "Failed to list {}: {}",
                        s3_uri(bucket, prefix),
                        DisplayErrorContext(&e)
                    ))
                })?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Listed {} key(s) under {}", keys.len(), s3_uri(bucket, prefix));
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ClientError::ObjectStore(format!(
                    "Failed to delete {}: {}",
                    s3_uri(bucket, key),
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ClientError::ObjectStore(format!(
                    "Failed to read {}: {}",
                    s3_uri(bucket, key),
                    DisplayErrorContext(&e)
                ))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| {
                ClientError::ObjectStore(format!(
                    "Failed to read body of {}: {}",
                    s3_uri(bucket, key),
                    e
                ))
            })?
            .into_bytes()
            .to_vec();

        Ok(data)
    }
}

/// Formats a bucket and key as an `s3://` URI
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_uri() {
        assert_eq!(
            s3_uri("my-sample-bucket", "data/outputData/"),
            "s3://my-sample-bucket/data/outputData/"
        );
    }

    #[test]
    fn test_s3_uri_strips_leading_slash() {
        assert_eq!(s3_uri("logs", "/emr/stderr.gz"), "s3://logs/emr/stderr.gz");
    }
}

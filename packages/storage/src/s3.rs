//! Production store over S3-compatible object storage.

use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;

use crate::{ObjectKeys, StorageError, ZoneStore};

/// Store backed by an S3-compatible bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    keys: ObjectKeys,
}

impl S3Store {
    /// Creates a store from the ambient AWS environment (credentials,
    /// region, optional endpoint override for non-AWS providers).
    pub async fn from_env(bucket: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&config).force_path_style(true);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: bucket.into(),
            keys: ObjectKeys::default(),
        }
    }

    /// Overrides the default object keys.
    #[must_use]
    pub fn with_keys(mut self, keys: ObjectKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Fetches an object, returning `None` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                // NoSuchKey is not an error: the object simply isn't there yet
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                return Err(StorageError::Read {
                    key: key.to_string(),
                    source: Box::new(err),
                });
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                source: Box::new(e),
            })?;
        Ok(Some(bytes.into_bytes().to_vec()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        log::info!(
            "Putting s3://{}/{key} ({} bytes)",
            self.bucket,
            bytes.len()
        );
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ZoneStore for S3Store {
    async fn load_reference(&self) -> Result<String, StorageError> {
        log::info!(
            "Loading reference boundary from s3://{}/{}",
            self.bucket,
            self.keys.reference
        );
        let bytes = self
            .get(&self.keys.reference)
            .await?
            .ok_or_else(|| StorageError::Missing {
                key: self.keys.reference.clone(),
            })?;
        String::from_utf8(bytes).map_err(|e| StorageError::Read {
            key: self.keys.reference.clone(),
            source: Box::new(e),
        })
    }

    async fn read_fingerprint(&self) -> Result<Option<String>, StorageError> {
        let Some(bytes) = self.get(&self.keys.fingerprint).await? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Read {
                key: self.keys.fingerprint.clone(),
                source: Box::new(e),
            })
    }

    async fn write_fingerprint(&self, digest: &str) -> Result<(), StorageError> {
        self.put(
            &self.keys.fingerprint,
            digest.as_bytes().to_vec(),
            "text/plain",
        )
        .await
    }

    async fn write_artifact(&self, bytes: &[u8]) -> Result<(), StorageError> {
        self.put(&self.keys.artifact, bytes.to_vec(), "application/geo+json")
            .await
    }

    async fn read_artifact(&self) -> Result<Option<Vec<u8>>, StorageError> {
        self.get(&self.keys.artifact).await
    }
}

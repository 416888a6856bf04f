//! S3-compatible storage client
//!
//! Wraps the AWS SDK for S3-compatible storage access. Uploaded study
//! materials go under a fixed logical folder; the returned URL is what the
//! catalog persists.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};

/// Logical folder all uploads land under.
pub const UPLOAD_PREFIX: &str = "study-materials";

/// S3-compatible storage client
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "studyshare",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        // Test connection by checking if bucket exists
        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket,
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store an uploaded file and return its durable retrieval URL.
    ///
    /// The object key is uuid-prefixed so repeated uploads of the same
    /// filename never overwrite each other.
    pub async fn store_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<String> {
        let key = format!("{}/{}-{}", UPLOAD_PREFIX, uuid::Uuid::new_v4(), filename);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to store {}: {}", key, e)))?;

        tracing::debug!("Stored upload at {}/{}", self.bucket, key);

        Ok(self.public_url(&key))
    }

    /// Path-style URL for a stored object.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

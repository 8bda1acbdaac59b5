//! S3-backed media store for avatar and cover-image uploads

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::store::{MediaAsset, MediaStore};

/// S3 configuration for media uploads
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket receiving user media
    pub bucket: String,
    /// Public base URL under which uploaded objects are served (CDN domain)
    pub base_url: String,
}

impl S3Config {
    /// Create a new S3Config from environment variables
    ///
    /// # Environment Variables
    /// - `S3_MEDIA_BUCKET`: Bucket name (default: "vidstream-media")
    /// - `S3_MEDIA_BASE_URL`: Public base URL for uploaded objects
    pub fn from_env() -> Result<Self> {
        let bucket =
            std::env::var("S3_MEDIA_BUCKET").unwrap_or_else(|_| "vidstream-media".to_string());
        let base_url = std::env::var("S3_MEDIA_BASE_URL")
            .map_err(|_| anyhow::anyhow!("S3_MEDIA_BASE_URL environment variable not set"))?;

        Ok(S3Config { bucket, base_url })
    }

    /// Public URL for an uploaded object
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Media store backed by S3
#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    config: S3Config,
}

impl S3MediaStore {
    /// Create a new S3 media store
    pub fn new(client: Client, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Build one from the ambient AWS environment
    pub async fn from_env(config: S3Config) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), config)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, asset: MediaAsset) -> Result<String> {
        // Key by a fresh UUID so user-supplied names can never collide
        let extension = asset
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        let key = format!("media/{}{}", Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(&asset.content_type)
            .body(ByteStream::from(asset.bytes))
            .send()
            .await?;

        let url = self.config.object_url(&key);
        info!("uploaded {} to {}", asset.file_name, url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_joins_cleanly() {
        let config = S3Config {
            bucket: "vidstream-media".to_string(),
            base_url: "https://cdn.vidstream.example/".to_string(),
        };
        assert_eq!(
            config.object_url("media/abc.png"),
            "https://cdn.vidstream.example/media/abc.png"
        );
    }
}

/// S3-compatible media storage backend
use crate::{
    error::{ApiError, ApiResult},
    media::{ImageBackend, ImageCategory},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// S3 media storage backend
///
/// Supports AWS S3 and S3-compatible storage providers (MinIO, DigitalOcean Spaces, etc.)
#[derive(Clone)]
pub struct S3ImageBackend {
    client: Arc<Client>,
    bucket: String,
    url_base: String,
}

/// Configuration for S3 storage
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// AWS region (e.g., "us-east-1")
    pub region: String,

    /// Custom endpoint for S3-compatible services (e.g., MinIO, DigitalOcean Spaces)
    /// Example: "https://nyc3.digitaloceanspaces.com" or "http://localhost:9000"
    pub endpoint: Option<String>,

    /// AWS access key ID
    pub access_key_id: String,

    /// AWS secret access key
    pub secret_access_key: String,

    /// Overrides the derived object URL prefix (e.g. a CDN in front of the bucket)
    pub public_base: Option<String>,
}

impl S3ImageBackend {
    /// Create a new S3 media backend
    pub async fn new(config: S3Config) -> ApiResult<Self> {
        info!(
            "Initializing S3 media storage (bucket: {}, region: {})",
            config.bucket, config.region
        );

        // Create credentials
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None, // session token
            None, // expiration
            "ripple",
        );

        // Build AWS config
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        // Build S3 config with optional custom endpoint
        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and some S3-compatible services
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        let url_base = Self::derive_url_base(&config);

        info!("S3 media storage initialized");

        Ok(Self {
            client: Arc::new(client),
            bucket: config.bucket,
            url_base,
        })
    }

    /// Get the S3 object key for an image
    fn get_key(category: ImageCategory, filename: &str) -> String {
        format!("{}/{}", category.as_str(), filename)
    }

    /// Public URL prefix objects are reachable under
    ///
    /// A configured public base wins; otherwise path-style through the
    /// custom endpoint, else the standard bucket URL.
    fn derive_url_base(config: &S3Config) -> String {
        if let Some(base) = &config.public_base {
            return base.trim_end_matches('/').to_string();
        }

        if let Some(endpoint) = &config.endpoint {
            return format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket);
        }

        format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region)
    }
}

#[async_trait]
impl ImageBackend for S3ImageBackend {
    async fn store(
        &self,
        category: ImageCategory,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> ApiResult<String> {
        let key = Self::get_key(category, filename);

        debug!(
            "Uploading image to S3: {} ({} bytes, type: {})",
            key,
            data.len(),
            content_type
        );

        let body = ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload image to S3: {}", e);
                ApiError::Storage(format!("S3 upload failed: {}", e))
            })?;

        debug!("Image uploaded to S3: {}", key);

        Ok(format!("{}/{}", self.url_base, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> S3Config {
        S3Config {
            bucket: "ripple-media".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            public_base: None,
        }
    }

    #[test]
    fn test_get_key() {
        assert_eq!(
            S3ImageBackend::get_key(ImageCategory::Posts, "123-cat.png"),
            "posts/123-cat.png"
        );
    }

    #[test]
    fn test_url_base_standard_bucket() {
        let url_base = S3ImageBackend::derive_url_base(&base_config());
        assert_eq!(url_base, "https://ripple-media.s3.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_url_base_custom_endpoint_is_path_style() {
        let config = S3Config {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..base_config()
        };
        assert_eq!(
            S3ImageBackend::derive_url_base(&config),
            "http://localhost:9000/ripple-media"
        );
    }

    #[test]
    fn test_url_base_public_base_wins() {
        let config = S3Config {
            endpoint: Some("http://localhost:9000".to_string()),
            public_base: Some("https://cdn.example.com/".to_string()),
            ..base_config()
        };
        assert_eq!(
            S3ImageBackend::derive_url_base(&config),
            "https://cdn.example.com"
        );
    }
}

/// Configuration management for Ripple
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Public base URL for served media, e.g. `https://ripple.example.com`
    pub public_url: String,
    /// Per-file upload limit in bytes
    pub image_size_limit: usize,
    /// Maximum number of image files accepted on one post
    pub max_images_per_post: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub media: MediaConfig,
}

/// Media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaConfig {
    Disk {
        location: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
        /// Overrides the derived object URL prefix (CDN fronting the bucket)
        public_base: Option<String>,
    },
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("RIPPLE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("RIPPLE_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;

        let public_url = env::var("RIPPLE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));
        let image_size_limit = env::var("RIPPLE_IMAGE_SIZE_LIMIT")
            .unwrap_or_else(|_| "5242880".to_string())
            .parse()
            .unwrap_or(5242880);
        let max_images_per_post = env::var("RIPPLE_MAX_IMAGES_PER_POST")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .unwrap_or(4);

        let data_directory: PathBuf = env::var("RIPPLE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("RIPPLE_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("ripple.sqlite"));

        let media = if let Ok(bucket) = env::var("RIPPLE_S3_BUCKET") {
            MediaConfig::S3 {
                bucket,
                region: env::var("RIPPLE_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("RIPPLE_S3_ACCESS_KEY_ID")
                    .map_err(|_| ApiError::Validation("S3 access key required".to_string()))?,
                secret_access_key: env::var("RIPPLE_S3_SECRET_ACCESS_KEY")
                    .map_err(|_| ApiError::Validation("S3 secret key required".to_string()))?,
                endpoint: env::var("RIPPLE_S3_ENDPOINT").ok(),
                public_base: env::var("RIPPLE_S3_PUBLIC_BASE").ok(),
            }
        } else {
            MediaConfig::Disk {
                location: env::var("RIPPLE_UPLOADS_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_directory.join("uploads")),
            }
        };

        let jwt_secret = env::var("RIPPLE_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                image_size_limit,
                max_images_per_post,
            },
            storage: StorageConfig {
                data_directory,
                database,
                media,
            },
            authentication: AuthConfig { jwt_secret },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.service.max_images_per_post == 0 {
            return Err(ApiError::Validation(
                "Image count limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

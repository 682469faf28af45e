/// Media store
///
/// Validates uploads and dispatches them to the configured backend.
use crate::{
    config::{MediaConfig, ServerConfig},
    error::{ApiError, ApiResult},
    media::{
        disk::DiskImageBackend,
        s3::{S3Config, S3ImageBackend},
        ImageBackend, ImageCategory,
    },
};
use chrono::Utc;
use std::sync::Arc;

/// Main media store
pub struct MediaStore {
    backend: Arc<dyn ImageBackend>,
    max_image_bytes: usize,
}

impl MediaStore {
    /// Wrap a backend with the store's validation rules
    pub fn new(backend: Arc<dyn ImageBackend>, max_image_bytes: usize) -> Self {
        Self {
            backend,
            max_image_bytes,
        }
    }

    /// Build the store from configuration, selecting the backend once
    pub async fn from_config(config: &ServerConfig) -> ApiResult<Self> {
        let backend: Arc<dyn ImageBackend> = match &config.storage.media {
            MediaConfig::Disk { location } => {
                tracing::info!("Using disk media storage at {}", location.display());
                Arc::new(DiskImageBackend::new(
                    location.clone(),
                    config.service.public_url.clone(),
                ))
            }
            MediaConfig::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
                public_base,
            } => Arc::new(
                S3ImageBackend::new(S3Config {
                    bucket: bucket.clone(),
                    region: region.clone(),
                    endpoint: endpoint.clone(),
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                    public_base: public_base.clone(),
                })
                .await?,
            ),
        };

        Ok(Self::new(backend, config.service.image_size_limit))
    }

    /// Validate one uploaded image and store it, returning its public URL
    pub async fn ingest(
        &self,
        category: ImageCategory,
        original_name: &str,
        declared_type: Option<&str>,
        data: Vec<u8>,
    ) -> ApiResult<String> {
        if data.is_empty() {
            return Err(ApiError::Validation("No image provided".to_string()));
        }

        if data.len() > self.max_image_bytes {
            return Err(ApiError::Validation(format!(
                "Image exceeds maximum size of {} bytes",
                self.max_image_bytes
            )));
        }

        if let Some(declared) = declared_type {
            if !declared.starts_with("image/") {
                return Err(ApiError::Validation(
                    "Only image uploads are allowed".to_string(),
                ));
            }
        }

        // The declared type is client-controlled; the bytes decide
        let format = image::guess_format(&data)
            .map_err(|_| ApiError::Validation("Only image uploads are allowed".to_string()))?;

        let filename = unique_filename(original_name);
        let url = self
            .backend
            .store(category, &filename, format.to_mime_type(), data)
            .await?;

        tracing::info!("Stored {} image {}", category.as_str(), filename);

        Ok(url)
    }
}

/// Collision-resistant object name: millisecond timestamp plus the
/// original name stripped to `[A-Za-z0-9_.-]`
fn unique_filename(original: &str) -> String {
    let safe: String = original
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    format!("{}-{}", Utc::now().timestamp_millis(), safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::new(4, 4);
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buf
    }

    fn disk_store(dir: &std::path::Path, max_image_bytes: usize) -> MediaStore {
        let backend =
            DiskImageBackend::new(dir.to_path_buf(), "http://localhost:5000".to_string());
        MediaStore::new(Arc::new(backend), max_image_bytes)
    }

    #[tokio::test]
    async fn test_ingest_valid_png() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), 1024 * 1024);

        let url = store
            .ingest(ImageCategory::Posts, "cat.png", Some("image/png"), png_bytes())
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:5000/uploads/posts/"));
        assert!(url.ends_with("-cat.png"));
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_payload() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), 1024 * 1024);

        let result = store
            .ingest(ImageCategory::Avatars, "cat.png", Some("image/png"), Vec::new())
            .await;

        match result {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "No image provided"),
            other => panic!("Expected Validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), 8);

        let result = store
            .ingest(ImageCategory::Posts, "cat.png", Some("image/png"), png_bytes())
            .await;

        match result {
            Err(ApiError::Validation(msg)) => assert!(msg.contains("exceeds maximum size")),
            other => panic!("Expected Validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_image_bytes() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), 1024 * 1024);

        let result = store
            .ingest(
                ImageCategory::Posts,
                "notes.txt",
                Some("image/png"),
                b"just some text".to_vec(),
            )
            .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_image_declared_type() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), 1024 * 1024);

        let result = store
            .ingest(
                ImageCategory::Posts,
                "cat.pdf",
                Some("application/pdf"),
                png_bytes(),
            )
            .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_unique_filename_sanitizes() {
        let name = unique_filename("my photo (1).png");
        assert!(name.ends_with("-myphoto1.png"));

        let prefix = name.split('-').next().unwrap();
        assert!(!prefix.is_empty());
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_unique_filename_keeps_safe_chars() {
        let name = unique_filename("pic_2-final.v1.jpeg");
        assert!(name.ends_with("-pic_2-final.v1.jpeg"));
    }
}

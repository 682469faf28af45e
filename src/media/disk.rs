/// Disk-based media storage backend
use crate::{
    error::{ApiError, ApiResult},
    media::{ImageBackend, ImageCategory},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Writes images under `{base}/{category}/{filename}`; the server mounts
/// the base directory at `/uploads`, so the returned URL is
/// `{public_url}/uploads/{category}/{filename}`.
#[derive(Clone)]
pub struct DiskImageBackend {
    base_path: PathBuf,
    public_url: String,
}

impl DiskImageBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf, public_url: String) -> Self {
        Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the file path for an image
    fn get_image_path(&self, category: ImageCategory, filename: &str) -> PathBuf {
        self.base_path.join(category.as_str()).join(filename)
    }
}

#[async_trait]
impl ImageBackend for DiskImageBackend {
    async fn store(
        &self,
        category: ImageCategory,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> ApiResult<String> {
        let image_path = self.get_image_path(category, filename);
        if let Some(parent) = image_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::Storage(format!("Failed to create upload directory: {}", e))
            })?;
        }

        fs::write(&image_path, data)
            .await
            .map_err(|e| ApiError::Storage(format!("Failed to write image {}: {}", filename, e)))?;

        Ok(format!(
            "{}/uploads/{}/{}",
            self.public_url,
            category.as_str(),
            filename
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let dir = tempdir().unwrap();
        let backend = DiskImageBackend::new(
            dir.path().to_path_buf(),
            "http://localhost:5000".to_string(),
        );

        let data = b"fake image bytes".to_vec();
        let url = backend
            .store(ImageCategory::Avatars, "123-pic.png", "image/png", data.clone())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:5000/uploads/avatars/123-pic.png");

        let written = fs::read(dir.path().join("avatars").join("123-pic.png"))
            .await
            .unwrap();
        assert_eq!(written, data);
    }

    #[tokio::test]
    async fn test_store_creates_category_directories() {
        let dir = tempdir().unwrap();
        let backend = DiskImageBackend::new(
            dir.path().to_path_buf(),
            "http://localhost:5000/".to_string(),
        );

        for category in [ImageCategory::Avatars, ImageCategory::Banners, ImageCategory::Posts] {
            backend
                .store(category, "x.png", "image/png", b"x".to_vec())
                .await
                .unwrap();
            assert!(dir.path().join(category.as_str()).join("x.png").exists());
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend =
            DiskImageBackend::new(PathBuf::from("/tmp"), "http://host:5000/".to_string());
        assert_eq!(backend.public_url, "http://host:5000");
    }
}

/// Media Storage System
///
/// Handles uploaded image files for avatars, banners, and post
/// attachments. Supports disk and S3 backend implementations, selected
/// once at startup from configuration.

pub mod disk;
pub mod s3;
pub mod store;

pub use store::MediaStore;

use crate::error::ApiResult;
use async_trait::async_trait;

/// Category an upload is filed under; doubles as the storage path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Avatars,
    Banners,
    Posts,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Avatars => "avatars",
            ImageCategory::Banners => "banners",
            ImageCategory::Posts => "posts",
        }
    }
}

/// Media storage backend trait
///
/// Implementations persist a named image under a category and return the
/// public URL it will be served from.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Store an image and return its public URL
    async fn store(
        &self,
        category: ImageCategory,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> ApiResult<String>;
}

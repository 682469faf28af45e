/// Post management system
///
/// Handles post creation, the follow-scoped feed, likes, editing, and deletion.

mod manager;

pub use manager::PostManager;

use crate::account::AccountSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post view returned by every post-reading operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub images: Vec<String>,
    pub likes: Vec<String>,
    pub likes_count: usize,
    pub created_at: DateTime<Utc>,
    pub author: AccountSummary,
    pub comments_count: i64,
}

/// Like-set summary returned by like and unlike
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub likes_count: usize,
    pub likes: Vec<String>,
}

/// Comment management system
///
/// Handles adding, listing, and deleting comments on posts.

mod manager;

pub use manager::CommentManager;

use crate::account::AccountSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment view with its author summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AccountSummary,
}

/// Comment creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

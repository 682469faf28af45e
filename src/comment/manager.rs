/// Comment manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::AccountSummary,
    comment::CommentView,
    db::models::AccountRecord,
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Comment row joined with its author
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    author_id: String,
    author_name: String,
    author_username: String,
    author_profile_picture: String,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        CommentView {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            author: AccountSummary {
                id: row.author_id,
                name: row.author_name,
                username: row.author_username,
                profile_picture: row.author_profile_picture,
            },
        }
    }
}

/// Comment manager service
pub struct CommentManager {
    db: SqlitePool,
}

impl CommentManager {
    /// Create a new comment manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a comment to a post
    pub async fn add_comment(
        &self,
        author: &AccountRecord,
        post_id: &str,
        content: String,
    ) -> ApiResult<CommentView> {
        if content.trim().is_empty() {
            return Err(ApiError::Validation("Content is required".to_string()));
        }

        self.require_post(post_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO comments (id, author_id, post_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(&author.id)
        .bind(post_id)
        .bind(&content)
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(author = %author.username, post = %post_id, "comment added");

        Ok(CommentView {
            id,
            content,
            created_at: now,
            author: AccountSummary {
                id: author.id.clone(),
                name: author.name.clone(),
                username: author.username.clone(),
                profile_picture: author.profile_picture.clone(),
            },
        })
    }

    /// List a post's comments, oldest first
    pub async fn list_comments(&self, post_id: &str) -> ApiResult<Vec<CommentView>> {
        self.require_post(post_id).await?;

        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.content, c.created_at,
                    a.id AS author_id, a.name AS author_name,
                    a.username AS author_username, a.profile_picture AS author_profile_picture
             FROM comments c
             JOIN accounts a ON a.id = c.author_id
             WHERE c.post_id = ?1
             ORDER BY c.created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    /// Delete a comment. Only the comment's author may delete it.
    pub async fn delete_comment(&self, actor_id: &str, comment_id: &str) -> ApiResult<()> {
        let author_id: Option<String> =
            sqlx::query_scalar("SELECT author_id FROM comments WHERE id = ?1")
                .bind(comment_id)
                .fetch_optional(&self.db)
                .await?;

        let author_id =
            author_id.ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
        if author_id != actor_id {
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }

        sqlx::query("DELETE FROM comments WHERE id = ?1")
            .bind(comment_id)
            .execute(&self.db)
            .await?;

        tracing::info!(comment = %comment_id, "comment deleted");

        Ok(())
    }

    /// Fail with NotFound unless the post exists
    async fn require_post(&self, post_id: &str) -> ApiResult<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = ?1")
            .bind(post_id)
            .fetch_one(&self.db)
            .await?;

        if count == 0 {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }

        Ok(())
    }
}

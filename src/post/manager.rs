/// Post manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::AccountSummary,
    db::models::{AccountRecord, PostRecord},
    error::{ApiError, ApiResult},
    post::{LikeSummary, PostView},
};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Post row joined with its author and live comment count
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    content: String,
    images: Json<Vec<String>>,
    likes: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    author_id: String,
    author_name: String,
    author_username: String,
    author_profile_picture: String,
    comments_count: i64,
}

impl From<PostRow> for PostView {
    fn from(row: PostRow) -> Self {
        let likes = row.likes.0;
        PostView {
            id: row.id,
            content: row.content,
            images: row.images.0,
            likes_count: likes.len(),
            likes,
            created_at: row.created_at,
            author: AccountSummary {
                id: row.author_id,
                name: row.author_name,
                username: row.author_username,
                profile_picture: row.author_profile_picture,
            },
            comments_count: row.comments_count,
        }
    }
}

/// Post manager service
pub struct PostManager {
    db: SqlitePool,
}

impl PostManager {
    /// Create a new post manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a post
    ///
    /// A post needs text or at least one image; both may be present.
    pub async fn create_post(
        &self,
        author: &AccountRecord,
        content: String,
        images: Vec<String>,
    ) -> ApiResult<PostView> {
        if content.trim().is_empty() && images.is_empty() {
            return Err(ApiError::Validation("Content or image required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO posts (id, author_id, content, images, likes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&id)
        .bind(&author.id)
        .bind(&content)
        .bind(Json(&images))
        .bind(Json(Vec::<String>::new()))
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(author = %author.username, post = %id, "post created");

        Ok(PostView {
            id,
            content,
            images,
            likes: Vec::new(),
            likes_count: 0,
            created_at: now,
            author: AccountSummary {
                id: author.id.clone(),
                name: author.name.clone(),
                username: author.username.clone(),
                profile_picture: author.profile_picture.clone(),
            },
            comments_count: 0,
        })
    }

    /// Feed of the viewer's own posts and posts from followed accounts,
    /// newest first
    pub async fn feed(&self, viewer: &AccountRecord) -> ApiResult<Vec<PostView>> {
        let mut author_ids = Vec::with_capacity(viewer.following.0.len() + 1);
        author_ids.push(viewer.id.clone());
        author_ids.extend(viewer.following.0.iter().cloned());

        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.content, p.images, p.likes, p.created_at,
                    a.id AS author_id, a.name AS author_name,
                    a.username AS author_username, a.profile_picture AS author_profile_picture,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
             FROM posts p
             JOIN accounts a ON a.id = p.author_id
             WHERE p.author_id IN (SELECT value FROM json_each(?1))
             ORDER BY p.created_at DESC",
        )
        .bind(Json(&author_ids))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }

    /// Get a single post by id
    pub async fn get_post(&self, post_id: &str) -> ApiResult<PostView> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.content, p.images, p.likes, p.created_at,
                    a.id AS author_id, a.name AS author_name,
                    a.username AS author_username, a.profile_picture AS author_profile_picture,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
             FROM posts p
             JOIN accounts a ON a.id = p.author_id
             WHERE p.id = ?1",
        )
        .bind(post_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

        Ok(row.into())
    }

    /// List one account's posts, newest first
    ///
    /// An unknown author id yields an empty list, not an error.
    pub async fn posts_by_user(&self, author_id: &str) -> ApiResult<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.content, p.images, p.likes, p.created_at,
                    a.id AS author_id, a.name AS author_name,
                    a.username AS author_username, a.profile_picture AS author_profile_picture,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
             FROM posts p
             JOIN accounts a ON a.id = p.author_id
             WHERE p.author_id = ?1
             ORDER BY p.created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }

    /// Edit a post's content and, when new images are supplied, replace its
    /// image set. Only the author may edit.
    pub async fn update_post(
        &self,
        actor_id: &str,
        post_id: &str,
        content: Option<String>,
        new_images: Option<Vec<String>>,
    ) -> ApiResult<PostView> {
        let post = sqlx::query_as::<_, PostRecord>("SELECT * FROM posts WHERE id = ?1")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

        if post.author_id != actor_id {
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }

        let content = content.unwrap_or(post.content);
        let images = match new_images {
            Some(images) if !images.is_empty() => images,
            _ => post.images.0,
        };

        if content.trim().is_empty() && images.is_empty() {
            return Err(ApiError::Validation("Content or image required".to_string()));
        }

        sqlx::query("UPDATE posts SET content = ?1, images = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&content)
            .bind(Json(&images))
            .bind(Utc::now())
            .bind(post_id)
            .execute(&self.db)
            .await?;

        self.get_post(post_id).await
    }

    /// Delete a post and its comments. Only the author may delete.
    pub async fn delete_post(&self, actor_id: &str, post_id: &str) -> ApiResult<()> {
        let mut tx = self.db.begin().await?;

        let author_id: Option<String> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = ?1")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;

        let author_id = author_id.ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
        if author_id != actor_id {
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }

        // Comments hang off the post and go with it
        sqlx::query("DELETE FROM comments WHERE post_id = ?1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = ?1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(post = %post_id, "post deleted");

        Ok(())
    }

    /// Like a post
    ///
    /// The append is guarded in a single statement so concurrent likes from
    /// different accounts extend the same set instead of overwriting it.
    pub async fn like_post(&self, actor_id: &str, post_id: &str) -> ApiResult<LikeSummary> {
        let updated = sqlx::query(
            "UPDATE posts
             SET likes = json_insert(likes, '$[#]', ?1), updated_at = ?2
             WHERE id = ?3
               AND NOT EXISTS (SELECT 1 FROM json_each(posts.likes) WHERE value = ?1)",
        )
        .bind(actor_id)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        // Missing post surfaces here as NotFound before the duplicate check
        let likes = self.like_set(post_id).await?;

        if updated == 0 {
            return Err(ApiError::Conflict("Already liked".to_string()));
        }

        Ok(LikeSummary {
            likes_count: likes.len(),
            likes,
        })
    }

    /// Remove a like. Removing a like that is not present is a no-op.
    pub async fn unlike_post(&self, actor_id: &str, post_id: &str) -> ApiResult<LikeSummary> {
        let updated = sqlx::query(
            "UPDATE posts
             SET likes = (SELECT coalesce(json_group_array(je.value), '[]')
                          FROM json_each(posts.likes) AS je
                          WHERE je.value <> ?1),
                 updated_at = ?2
             WHERE id = ?3",
        )
        .bind(actor_id)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }

        let likes = self.like_set(post_id).await?;

        Ok(LikeSummary {
            likes_count: likes.len(),
            likes,
        })
    }

    /// Current like set for a post
    async fn like_set(&self, post_id: &str) -> ApiResult<Vec<String>> {
        let likes: Option<Json<Vec<String>>> =
            sqlx::query_scalar("SELECT likes FROM posts WHERE id = ?1")
                .bind(post_id)
                .fetch_optional(&self.db)
                .await?;

        likes
            .map(|l| l.0)
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountManager;
    use crate::config::{
        AuthConfig, LoggingConfig, MediaConfig, ServerConfig, ServiceConfig, StorageConfig,
    };
    use crate::db::DatabaseOptions;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 5000,
                public_url: "http://localhost:5000".to_string(),
                image_size_limit: 5 * 1024 * 1024,
                max_images_per_post: 4,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from("./data/ripple.sqlite"),
                media: MediaConfig::Disk {
                    location: PathBuf::from("./data/uploads"),
                },
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only-0123456789".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    async fn create_test_managers() -> (AccountManager, PostManager, SqlitePool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::create_pool(&dir.path().join("test.sqlite"), DatabaseOptions::default())
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let accounts = AccountManager::new(pool.clone(), Arc::new(test_config()));
        let posts = PostManager::new(pool.clone());

        (accounts, posts, pool, dir)
    }

    async fn register(manager: &AccountManager, name: &str, username: &str) -> AccountRecord {
        manager
            .create_account(
                name.to_string(),
                username.to_string(),
                format!("{}@example.com", username),
                "pw123456".to_string(),
            )
            .await
            .unwrap()
    }

    async fn insert_comment(db: &SqlitePool, author_id: &str, post_id: &str) {
        sqlx::query(
            "INSERT INTO comments (id, author_id, post_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(author_id)
        .bind(post_id)
        .bind("nice one")
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_post_requires_content_or_images() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;

        let result = posts
            .create_post(&alice, "   ".to_string(), Vec::new())
            .await;

        match result {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Content or image required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_post_with_only_images() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;

        let post = posts
            .create_post(
                &alice,
                String::new(),
                vec!["http://localhost:5000/uploads/posts/1-a.png".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(post.content, "");
        assert_eq!(post.images.len(), 1);
        assert_eq!(post.author.username, "alice");
        assert_eq!(post.comments_count, 0);
    }

    #[tokio::test]
    async fn test_feed_shows_own_and_followed_posts_newest_first() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let bob = register(&accounts, "Bob", "bob").await;
        let carol = register(&accounts, "Carol", "carol").await;

        accounts.follow(&alice.id, &bob.id).await.unwrap();

        let first = posts
            .create_post(&alice, "from alice".to_string(), Vec::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = posts
            .create_post(&bob, "from bob".to_string(), Vec::new())
            .await
            .unwrap();
        posts
            .create_post(&carol, "from carol".to_string(), Vec::new())
            .await
            .unwrap();

        // The follow happened after alice's record was loaded
        let alice = accounts.get_account(&alice.id).await.unwrap();

        let feed = posts.feed(&alice).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, second.id);
        assert_eq!(feed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_feed_includes_live_comment_counts() {
        let (accounts, posts, pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;

        let post = posts
            .create_post(&alice, "hello".to_string(), Vec::new())
            .await
            .unwrap();
        insert_comment(&pool, &alice.id, &post.id).await;
        insert_comment(&pool, &alice.id, &post.id).await;

        let feed = posts.feed(&alice).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].comments_count, 2);

        let fetched = posts.get_post(&post.id).await.unwrap();
        assert_eq!(fetched.comments_count, 2);
    }

    #[tokio::test]
    async fn test_get_post_missing_not_found() {
        let (_accounts, posts, _pool, _dir) = create_test_managers().await;

        let missing = Uuid::new_v4().to_string();
        match posts.get_post(&missing).await {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Post not found"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_posts_by_user_newest_first_and_empty_for_unknown() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;

        let first = posts
            .create_post(&alice, "one".to_string(), Vec::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = posts
            .create_post(&alice, "two".to_string(), Vec::new())
            .await
            .unwrap();

        let listed = posts.posts_by_user(&alice.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let unknown = Uuid::new_v4().to_string();
        assert!(posts.posts_by_user(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_then_duplicate_conflict() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let post = posts
            .create_post(&alice, "hello".to_string(), Vec::new())
            .await
            .unwrap();

        let summary = posts.like_post(&alice.id, &post.id).await.unwrap();
        assert_eq!(summary.likes_count, 1);
        assert_eq!(summary.likes, vec![alice.id.clone()]);

        match posts.like_post(&alice.id, &post.id).await {
            Err(ApiError::Conflict(msg)) => assert_eq!(msg, "Already liked"),
            other => panic!("expected conflict, got {:?}", other),
        }

        // The failed duplicate must not have grown the set
        let fetched = posts.get_post(&post.id).await.unwrap();
        assert_eq!(fetched.likes_count, 1);
    }

    #[tokio::test]
    async fn test_likes_from_different_accounts_accumulate() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let bob = register(&accounts, "Bob", "bob").await;
        let post = posts
            .create_post(&alice, "hello".to_string(), Vec::new())
            .await
            .unwrap();

        posts.like_post(&alice.id, &post.id).await.unwrap();
        let summary = posts.like_post(&bob.id, &post.id).await.unwrap();

        assert_eq!(summary.likes_count, 2);
        assert!(summary.likes.contains(&alice.id));
        assert!(summary.likes.contains(&bob.id));
    }

    #[tokio::test]
    async fn test_unlike_is_idempotent() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let post = posts
            .create_post(&alice, "hello".to_string(), Vec::new())
            .await
            .unwrap();

        posts.like_post(&alice.id, &post.id).await.unwrap();

        let summary = posts.unlike_post(&alice.id, &post.id).await.unwrap();
        assert_eq!(summary.likes_count, 0);

        // A second unlike is a no-op, not an error
        let summary = posts.unlike_post(&alice.id, &post.id).await.unwrap();
        assert_eq!(summary.likes_count, 0);
    }

    #[tokio::test]
    async fn test_like_missing_post_not_found() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;

        let missing = Uuid::new_v4().to_string();
        match posts.like_post(&alice.id, &missing).await {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Post not found"),
            other => panic!("expected not found, got {:?}", other),
        }
        match posts.unlike_post(&alice.id, &missing).await {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Post not found"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_post_cascades_comments() {
        let (accounts, posts, pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let post = posts
            .create_post(&alice, "hello".to_string(), Vec::new())
            .await
            .unwrap();
        insert_comment(&pool, &alice.id, &post.id).await;

        posts.delete_post(&alice.id, &post.id).await.unwrap();

        match posts.get_post(&post.id).await {
            Err(ApiError::NotFound(_)) => {}
            other => panic!("expected not found, got {:?}", other),
        }

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?1")
            .bind(&post.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_delete_post_requires_ownership() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let bob = register(&accounts, "Bob", "bob").await;
        let post = posts
            .create_post(&bob, "bob's post".to_string(), Vec::new())
            .await
            .unwrap();

        match posts.delete_post(&alice.id, &post.id).await {
            Err(ApiError::Forbidden(msg)) => assert_eq!(msg, "Forbidden"),
            other => panic!("expected forbidden, got {:?}", other),
        }

        // Still retrievable after the rejected delete
        assert!(posts.get_post(&post.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_post_keeps_images_unless_replaced() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let post = posts
            .create_post(
                &alice,
                "hello".to_string(),
                vec!["http://localhost:5000/uploads/posts/1-a.png".to_string()],
            )
            .await
            .unwrap();

        let edited = posts
            .update_post(&alice.id, &post.id, Some("edited".to_string()), None)
            .await
            .unwrap();
        assert_eq!(edited.content, "edited");
        assert_eq!(edited.images, post.images);

        let replaced = posts
            .update_post(
                &alice.id,
                &post.id,
                None,
                Some(vec!["http://localhost:5000/uploads/posts/2-b.png".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(replaced.content, "edited");
        assert_eq!(
            replaced.images,
            vec!["http://localhost:5000/uploads/posts/2-b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_post_requires_ownership() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let bob = register(&accounts, "Bob", "bob").await;
        let post = posts
            .create_post(&bob, "bob's post".to_string(), Vec::new())
            .await
            .unwrap();

        match posts
            .update_post(&alice.id, &post.id, Some("hijack".to_string()), None)
            .await
        {
            Err(ApiError::Forbidden(msg)) => assert_eq!(msg, "Forbidden"),
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_post_cannot_empty_out_content_and_images() {
        let (accounts, posts, _pool, _dir) = create_test_managers().await;
        let alice = register(&accounts, "Alice", "alice").await;
        let post = posts
            .create_post(&alice, "text only".to_string(), Vec::new())
            .await
            .unwrap();

        match posts
            .update_post(&alice.id, &post.id, Some("   ".to_string()), None)
            .await
        {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Content or image required"),
            other => panic!("expected validation error, got {:?}", other),
        }

        // The stored post is untouched by the rejected edit
        let unchanged = posts.get_post(&post.id).await.unwrap();
        assert_eq!(unchanged.content, "text only");
    }
}

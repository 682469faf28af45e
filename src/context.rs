/// Application context and dependency injection
use crate::{
    account::AccountManager,
    comment::CommentManager,
    config::{MediaConfig, ServerConfig},
    db,
    error::ApiResult,
    media::MediaStore,
    post::PostManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub post_manager: Arc<PostManager>,
    pub comment_manager: Arc<CommentManager>,
    pub media_store: Arc<MediaStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let config = Arc::new(config);
        let account_manager = Arc::new(AccountManager::new(db.clone(), config.clone()));
        let post_manager = Arc::new(PostManager::new(db.clone()));
        let comment_manager = Arc::new(CommentManager::new(db.clone()));
        let media_store = Arc::new(MediaStore::from_config(&config).await?);

        Ok(Self {
            config,
            db,
            account_manager,
            post_manager,
            comment_manager,
            media_store,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ApiResult<()> {
        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        // Create the upload directory if media is stored on disk
        if let MediaConfig::Disk { location } = &config.storage.media {
            tokio::fs::create_dir_all(location).await?;
        }

        Ok(())
    }
}

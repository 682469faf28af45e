/// Account manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::{AccountSummary, FollowCounts, Profile, ProfileKey, ProfileUpdate, SearchResult},
    auth,
    config::ServerConfig,
    db::models::AccountRecord,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Register a new account
    ///
    /// Usernames and emails are normalized to lowercase before storage, so
    /// uniqueness checks are case-insensitive.
    pub async fn create_account(
        &self,
        name: String,
        username: String,
        email: String,
        password: String,
    ) -> ApiResult<AccountRecord> {
        let name = name.trim().to_string();
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();

        if name.is_empty() || username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }

        if self.username_exists(&username).await? {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }

        if self.email_exists(&email).await? {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = auth::hash_password(&password)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO accounts (id, name, username, email, password_hash, bio, profile_picture, banner, followers, following, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind("")
        .bind("")
        .bind("")
        .bind(Json(Vec::<String>::new()))
        .bind(Json(Vec::<String>::new()))
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(%username, "account created");

        Ok(AccountRecord {
            id,
            name,
            username,
            email,
            password_hash,
            bio: String::new(),
            profile_picture: String::new(),
            banner: String::new(),
            followers: Json(Vec::new()),
            following: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        })
    }

    /// Authenticate by email and password, returning the account and a signed token
    ///
    /// Unknown emails and wrong passwords produce the same error so the
    /// response does not reveal which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(AccountRecord, String)> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let account = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE email = ?1")
            .bind(&email)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

        if !auth::verify_password(password, &account.password_hash)? {
            return Err(ApiError::Auth("Invalid credentials".to_string()));
        }

        let token = auth::generate_token(&account.id, &self.config.authentication.jwt_secret)?;

        Ok((account, token))
    }

    /// Get account by id
    pub async fn get_account(&self, id: &str) -> ApiResult<AccountRecord> {
        sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Get account by username (stored lowercase)
    async fn get_account_by_username(&self, username: &str) -> ApiResult<AccountRecord> {
        sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Look up a public profile by id or username
    pub async fn get_profile(&self, key: &ProfileKey) -> ApiResult<Profile> {
        let account = match key {
            ProfileKey::Id(id) => self.get_account(id).await?,
            ProfileKey::Username(username) => self.get_account_by_username(username).await?,
        };

        Ok(profile_view(&account))
    }

    /// Apply a partial profile update
    ///
    /// Name and username are only changed when the new value is non-empty;
    /// bio accepts the empty string so it can be cleared.
    pub async fn update_profile(
        &self,
        account: &AccountRecord,
        update: ProfileUpdate,
    ) -> ApiResult<AccountRecord> {
        let name = match update.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => account.name.clone(),
        };

        let username = match update.username.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => {
                let normalized = u.to_lowercase();
                if normalized != account.username && self.username_exists(&normalized).await? {
                    return Err(ApiError::Conflict("Username already taken".to_string()));
                }
                normalized
            }
            _ => account.username.clone(),
        };

        let bio = update.bio.unwrap_or_else(|| account.bio.clone());

        let now = Utc::now();
        sqlx::query(
            "UPDATE accounts SET name = ?1, username = ?2, bio = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(&name)
        .bind(&username)
        .bind(&bio)
        .bind(now)
        .bind(&account.id)
        .execute(&self.db)
        .await?;

        Ok(AccountRecord {
            name,
            username,
            bio,
            updated_at: now,
            ..account.clone()
        })
    }

    /// Set the profile picture URL
    pub async fn set_profile_picture(&self, account_id: &str, url: &str) -> ApiResult<()> {
        sqlx::query("UPDATE accounts SET profile_picture = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(url)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Set the banner URL
    pub async fn set_banner(&self, account_id: &str, url: &str) -> ApiResult<()> {
        sqlx::query("UPDATE accounts SET banner = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(url)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Search accounts by username substring, case-insensitively
    ///
    /// An empty query matches nothing. LIKE wildcards in the query are
    /// escaped so they match literally.
    pub async fn search(&self, query: &str) -> ApiResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let accounts = sqlx::query_as::<_, AccountRecord>(
            "SELECT * FROM accounts WHERE username LIKE ?1 ESCAPE '\\' LIMIT 20",
        )
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(accounts
            .iter()
            .map(|a| SearchResult {
                id: a.id.clone(),
                name: a.name.clone(),
                username: a.username.clone(),
                bio: a.bio.clone(),
                profile_picture: a.profile_picture.clone(),
            })
            .collect())
    }

    /// Follow another account
    ///
    /// Both sides of the edge are written in one transaction so a failure
    /// cannot leave the graph half-updated. Returns the target's follower
    /// count and the actor's following count.
    pub async fn follow(&self, actor_id: &str, target_id: &str) -> ApiResult<FollowCounts> {
        if actor_id == target_id {
            return Err(ApiError::Validation("Cannot follow yourself".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let target = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let actor = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(actor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if target.followers.0.iter().any(|id| id == actor_id) {
            return Err(ApiError::Conflict("Already following".to_string()));
        }

        let mut followers = target.followers.0;
        followers.push(actor_id.to_string());
        let mut following = actor.following.0;
        following.push(target_id.to_string());

        let now = Utc::now();
        sqlx::query("UPDATE accounts SET followers = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(Json(&followers))
            .bind(now)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE accounts SET following = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(Json(&following))
            .bind(now)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %actor_id, target = %target_id, "follow recorded");

        Ok(FollowCounts {
            followers_count: followers.len(),
            following_count: following.len(),
        })
    }

    /// Unfollow an account
    ///
    /// Removing an edge that does not exist is a no-op, so repeated
    /// unfollows succeed. The target must still exist.
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> ApiResult<FollowCounts> {
        let mut tx = self.db.begin().await?;

        let target = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let actor = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(actor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let mut followers = target.followers.0;
        followers.retain(|id| id != actor_id);
        let mut following = actor.following.0;
        following.retain(|id| id != target_id);

        let now = Utc::now();
        sqlx::query("UPDATE accounts SET followers = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(Json(&followers))
            .bind(now)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE accounts SET following = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(Json(&following))
            .bind(now)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %actor_id, target = %target_id, "unfollow recorded");

        Ok(FollowCounts {
            followers_count: followers.len(),
            following_count: following.len(),
        })
    }

    /// List the accounts following the given account
    pub async fn followers(&self, account_id: &str) -> ApiResult<Vec<AccountSummary>> {
        let account = self.get_account(account_id).await?;
        self.summaries_for_ids(&account.followers.0).await
    }

    /// List the accounts the given account follows
    pub async fn following(&self, account_id: &str) -> ApiResult<Vec<AccountSummary>> {
        let account = self.get_account(account_id).await?;
        self.summaries_for_ids(&account.following.0).await
    }

    /// Resolve a list of account ids to compact summaries, in list order
    async fn summaries_for_ids(&self, ids: &[String]) -> ApiResult<Vec<AccountSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = sqlx::query_as::<_, AccountRecord>(
            "SELECT a.* FROM json_each(?1) AS ids
             JOIN accounts a ON a.id = ids.value
             ORDER BY ids.key",
        )
        .bind(Json(ids))
        .fetch_all(&self.db)
        .await?;

        Ok(accounts.iter().map(account_summary).collect())
    }

    /// Check if username exists
    async fn username_exists(&self, username: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Check if email exists
    async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Build the public profile view of an account
pub fn profile_view(account: &AccountRecord) -> Profile {
    Profile {
        id: account.id.clone(),
        name: account.name.clone(),
        username: account.username.clone(),
        bio: account.bio.clone(),
        profile_picture: account.profile_picture.clone(),
        banner: account.banner.clone(),
        followers_count: account.followers.0.len(),
        following_count: account.following.0.len(),
    }
}

/// Build the compact summary view of an account
pub fn account_summary(account: &AccountRecord) -> AccountSummary {
    AccountSummary {
        id: account.id.clone(),
        name: account.name.clone(),
        username: account.username.clone(),
        profile_picture: account.profile_picture.clone(),
    }
}

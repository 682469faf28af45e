/// Record types for the accounts and posts tables
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

/// Account record in the database
///
/// `followers` and `following` are JSON id-arrays with set semantics
/// enforced by the account manager. `username` and `email` are stored
/// lowercase, which is what makes the UNIQUE indexes case-insensitive.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub profile_picture: String,
    pub banner: String,
    pub followers: Json<Vec<String>>,
    pub following: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post record in the database
///
/// Comments are not modeled as a record here; readers join them with
/// their author row directly.
#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub images: Json<Vec<String>>,
    pub likes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account management system
///
/// Handles registration, login, profiles, search, and the follow graph.

mod manager;

pub use manager::AccountManager;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compact account view embedded in posts, comments, and follow listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub profile_picture: String,
}

/// Public profile view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub profile_picture: String,
    pub banner: String,
    pub followers_count: usize,
    pub following_count: usize,
}

/// Search result entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub profile_picture: String,
}

/// Follower/following counts returned by follow graph mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCounts {
    pub followers_count: usize,
    pub following_count: usize,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
}

/// Profile fields returned after an update, without counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub profile_picture: String,
    pub banner: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account fields embedded in the login response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub token: String,
}

/// The authenticated account's own view (for /auth/me)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_picture: String,
    pub banner: String,
    pub followers_count: usize,
    pub following_count: usize,
}

/// Avatar upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub profile_picture: String,
}

/// Banner upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerResponse {
    pub banner: String,
}

/// Profile lookup key
///
/// Profile routes accept either an account id or a username. The two are
/// disambiguated up front so lookups never fall through from one namespace
/// to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKey {
    Id(String),
    Username(String),
}

impl ProfileKey {
    /// Classify a raw path segment as an id or a username
    pub fn parse(raw: &str) -> Self {
        if Uuid::parse_str(raw).is_ok() {
            ProfileKey::Id(raw.to_string())
        } else {
            ProfileKey::Username(raw.trim().to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_key_classifies_uuid_as_id() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(ProfileKey::parse(&id), ProfileKey::Id(id));
    }

    #[test]
    fn test_profile_key_lowercases_usernames() {
        assert_eq!(
            ProfileKey::parse("Alice"),
            ProfileKey::Username("alice".to_string())
        );
    }

    #[test]
    fn test_profile_key_trims_usernames() {
        assert_eq!(
            ProfileKey::parse(" bob "),
            ProfileKey::Username("bob".to_string())
        );
    }
}

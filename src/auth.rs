/// Authentication primitives and extractors
use crate::{context::AppContext, db::models::AccountRecord, error::ApiError};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session credential lifetime: seven days
const TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

/// JWT claims carried by a session credential
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Hash a password with salted Argon2id
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issue a session credential for an account id
pub fn generate_token(account_id: &str, jwt_secret: &str) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verify a session credential
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
pub fn verify_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("Token verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Auth("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::Auth("Invalid token signature".to_string())
                }
                _ => ApiError::Auth("Invalid token".to_string()),
            }
        })
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            if s.starts_with("Bearer ") {
                Some(s[7..].to_string())
            } else {
                None
            }
        })
}

/// Authenticated actor - validates the bearer token, then loads the live
/// account record so a vanished account invalidates its outstanding tokens.
/// Failure modes all surface as the same 401 to the client.
#[derive(Debug, Clone)]
pub struct Actor {
    pub account: AccountRecord,
}

#[async_trait]
impl FromRequestParts<AppContext> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Auth("Unauthorized".to_string()))?;

        let claims = verify_token(&token, &state.config.authentication.jwt_secret)
            .map_err(|_| ApiError::Auth("Unauthorized".to_string()))?;

        let account = match state.account_manager.get_account(&claims.sub).await {
            Ok(account) => account,
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::Auth("Unauthorized".to_string()));
            }
            Err(e) => return Err(e),
        };

        Ok(Actor { account })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars-long";

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pw123456").unwrap();
        assert_ne!(hash, "pw123456");
        assert!(verify_password("pw123456", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let first = hash_password("pw123456").unwrap();
        let second = hash_password("pw123456").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_token_roundtrip() {
        let token = generate_token("account-1", SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = generate_token("account-1", SECRET).unwrap();
        let result = verify_token(&token, "a-different-secret-also-32-chars-long");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert!(verify_token("not-a-token", SECRET).is_err());
    }

    #[test]
    fn test_token_rejects_expired() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "account-1".to_string(),
            iat: now - 9000,
            exp: now - 3600, // Well past the 300s leeway
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        match verify_token(&token, SECRET) {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("expired")),
            other => panic!("Expected Auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);

        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}

/// API routes and handlers
pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use axum::extract::multipart::Multipart;
use axum::extract::FromRequest;
use axum::{Json, Router};
use uuid::Uuid;

/// JSON body extractor whose rejection uses the standard error envelope
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Multipart body extractor whose rejection uses the standard error envelope
#[derive(FromRequest)]
#[from_request(rejection(ApiError))]
pub struct AppMultipart(pub Multipart);

/// Reject path segments that must be record ids but are not valid uuids
pub(crate) fn require_id(raw: &str) -> ApiResult<()> {
    if Uuid::parse_str(raw).is_err() {
        return Err(ApiError::Validation("Invalid id".to_string()));
    }

    Ok(())
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(posts::routes())
        .merge(comments::routes())
}

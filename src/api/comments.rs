/// /posts/:id/comments endpoints
use crate::{
    api::{require_id, AppJson},
    auth::Actor,
    comment::{AddCommentRequest, CommentView},
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

/// Build comment routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/posts/:id/comments", get(list_comments).post(add_comment))
        .route("/posts/:id/comments/:comment_id", delete(delete_comment))
}

/// List a post's comments, oldest first
async fn list_comments(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>> {
    require_id(&id)?;

    Ok(Json(ctx.comment_manager.list_comments(&id).await?))
}

/// Add a comment to a post
async fn add_comment(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
    AppJson(req): AppJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    require_id(&id)?;

    let view = ctx
        .comment_manager
        .add_comment(&actor.account, &id, req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Delete a comment
///
/// The post id in the path is validated but the comment is deleted by its
/// own id alone.
async fn delete_comment(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_id(&post_id)?;
    require_id(&comment_id)?;

    ctx.comment_manager
        .delete_comment(&actor.account.id, &comment_id)
        .await?;

    Ok(Json(serde_json::json!({})))
}

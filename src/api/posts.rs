/// /posts/* endpoints
use crate::{
    api::{require_id, AppMultipart},
    auth::Actor,
    context::AppContext,
    error::{ApiError, ApiResult},
    media::ImageCategory,
    post::{LikeSummary, PostView},
};
use axum::{
    extract::{multipart::Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use futures::future::try_join_all;

/// Build post routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/posts", get(feed).post(create_post))
        .route("/posts/feed", get(feed))
        .route("/posts/user/:id", get(posts_by_user))
        .route("/posts/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/:id/like", post(like_post).delete(unlike_post))
}

/// One file from the post form
struct ImageUpload {
    filename: String,
    declared: Option<String>,
    data: Vec<u8>,
}

/// Feed endpoint: the viewer's own posts plus followed accounts' posts
async fn feed(State(ctx): State<AppContext>, actor: Actor) -> ApiResult<Json<Vec<PostView>>> {
    Ok(Json(ctx.post_manager.feed(&actor.account).await?))
}

/// Create a post from a multipart form (`content` text, `images` files)
async fn create_post(
    State(ctx): State<AppContext>,
    actor: Actor,
    AppMultipart(mut multipart): AppMultipart,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    let (content, uploads) = read_post_form(&ctx, &mut multipart).await?;

    let images = store_post_images(&ctx, uploads).await?;
    let view = ctx
        .post_manager
        .create_post(&actor.account, content.unwrap_or_default(), images)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a post by id
async fn get_post(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<PostView>> {
    require_id(&id)?;

    Ok(Json(ctx.post_manager.get_post(&id).await?))
}

/// Edit a post; newly uploaded images replace the old set
async fn update_post(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
    AppMultipart(mut multipart): AppMultipart,
) -> ApiResult<Json<PostView>> {
    require_id(&id)?;

    // Ownership is checked before any image is stored
    let existing = ctx.post_manager.get_post(&id).await?;
    if existing.author.id != actor.account.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let (content, uploads) = read_post_form(&ctx, &mut multipart).await?;
    let new_images = if uploads.is_empty() {
        None
    } else {
        Some(store_post_images(&ctx, uploads).await?)
    };

    let view = ctx
        .post_manager
        .update_post(&actor.account.id, &id, content, new_images)
        .await?;

    Ok(Json(view))
}

/// Delete a post
async fn delete_post(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_id(&id)?;

    ctx.post_manager.delete_post(&actor.account.id, &id).await?;

    Ok(Json(serde_json::json!({})))
}

/// List one account's posts
async fn posts_by_user(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<PostView>>> {
    require_id(&id)?;

    Ok(Json(ctx.post_manager.posts_by_user(&id).await?))
}

/// Like a post
async fn like_post(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeSummary>> {
    require_id(&id)?;

    Ok(Json(ctx.post_manager.like_post(&actor.account.id, &id).await?))
}

/// Remove a like from a post
async fn unlike_post(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeSummary>> {
    require_id(&id)?;

    Ok(Json(
        ctx.post_manager.unlike_post(&actor.account.id, &id).await?,
    ))
}

/// Read the post form: optional `content` text plus `images` files, capped
/// at the configured per-post count
async fn read_post_form(
    ctx: &AppContext,
    multipart: &mut Multipart,
) -> ApiResult<(Option<String>, Vec<ImageUpload>)> {
    let mut content = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("content") => content = Some(field.text().await?),
            Some("images") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let declared = field.content_type().map(|c| c.to_string());
                let data = field.bytes().await?.to_vec();
                uploads.push(ImageUpload {
                    filename,
                    declared,
                    data,
                });
            }
            _ => {}
        }
    }

    if uploads.len() > ctx.config.service.max_images_per_post {
        return Err(ApiError::Validation(format!(
            "At most {} images per post",
            ctx.config.service.max_images_per_post
        )));
    }

    Ok((content, uploads))
}

/// Store every uploaded image; any failure drops the whole batch
async fn store_post_images(ctx: &AppContext, uploads: Vec<ImageUpload>) -> ApiResult<Vec<String>> {
    try_join_all(uploads.into_iter().map(|upload| async move {
        ctx.media_store
            .ingest(
                ImageCategory::Posts,
                &upload.filename,
                upload.declared.as_deref(),
                upload.data,
            )
            .await
    }))
    .await
}

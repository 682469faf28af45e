/// /users/* endpoints
use crate::{
    account::{
        AccountSummary, AvatarResponse, BannerResponse, FollowCounts, Profile, ProfileKey,
        ProfileUpdate, ProfileUpdateResponse, SearchResult,
    },
    api::{require_id, AppJson, AppMultipart},
    auth::Actor,
    context::AppContext,
    error::{ApiError, ApiResult},
    media::ImageCategory,
};
use axum::{
    extract::{multipart::Multipart, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users/search", get(search))
        .route("/users/profile", put(update_profile))
        .route("/users/profile-picture", post(upload_avatar))
        .route("/users/banner", post(upload_banner))
        .route("/users/:id", get(get_profile))
        .route("/users/:id/followers", get(followers))
        .route("/users/:id/following", get(following))
        .route("/users/:id/follow", post(follow).delete(unfollow))
}

/// Search query parameters
#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// Search accounts by name or username
async fn search(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    Ok(Json(ctx.account_manager.search(&params.q).await?))
}

/// Public profile lookup, by account id or username
async fn get_profile(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Profile>> {
    let key = ProfileKey::parse(&id);

    Ok(Json(ctx.account_manager.get_profile(&key).await?))
}

/// Update the authenticated account's profile
async fn update_profile(
    State(ctx): State<AppContext>,
    actor: Actor,
    AppJson(update): AppJson<ProfileUpdate>,
) -> ApiResult<Json<ProfileUpdateResponse>> {
    let updated = ctx
        .account_manager
        .update_profile(&actor.account, update)
        .await?;

    Ok(Json(ProfileUpdateResponse {
        id: updated.id,
        name: updated.name,
        username: updated.username,
        bio: updated.bio,
        profile_picture: updated.profile_picture,
        banner: updated.banner,
    }))
}

/// Upload a new profile picture
async fn upload_avatar(
    State(ctx): State<AppContext>,
    actor: Actor,
    AppMultipart(mut multipart): AppMultipart,
) -> ApiResult<Json<AvatarResponse>> {
    let (filename, declared, data) = single_image(&mut multipart).await?;
    let url = ctx
        .media_store
        .ingest(ImageCategory::Avatars, &filename, declared.as_deref(), data)
        .await?;

    ctx.account_manager
        .set_profile_picture(&actor.account.id, &url)
        .await?;

    Ok(Json(AvatarResponse {
        profile_picture: url,
    }))
}

/// Upload a new banner
async fn upload_banner(
    State(ctx): State<AppContext>,
    actor: Actor,
    AppMultipart(mut multipart): AppMultipart,
) -> ApiResult<Json<BannerResponse>> {
    let (filename, declared, data) = single_image(&mut multipart).await?;
    let url = ctx
        .media_store
        .ingest(ImageCategory::Banners, &filename, declared.as_deref(), data)
        .await?;

    ctx.account_manager.set_banner(&actor.account.id, &url).await?;

    Ok(Json(BannerResponse { banner: url }))
}

/// List followers of an account
async fn followers(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AccountSummary>>> {
    require_id(&id)?;

    Ok(Json(ctx.account_manager.followers(&id).await?))
}

/// List accounts an account follows
async fn following(
    State(ctx): State<AppContext>,
    _actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AccountSummary>>> {
    require_id(&id)?;

    Ok(Json(ctx.account_manager.following(&id).await?))
}

/// Follow an account
async fn follow(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<FollowCounts>> {
    require_id(&id)?;

    Ok(Json(ctx.account_manager.follow(&actor.account.id, &id).await?))
}

/// Unfollow an account
async fn unfollow(
    State(ctx): State<AppContext>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<FollowCounts>> {
    require_id(&id)?;

    Ok(Json(
        ctx.account_manager.unfollow(&actor.account.id, &id).await?,
    ))
}

/// Pull the single `image` field out of a multipart body
async fn single_image(multipart: &mut Multipart) -> ApiResult<(String, Option<String>, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        if name.as_deref() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let declared = field.content_type().map(|c| c.to_string());
        let data = field.bytes().await?.to_vec();

        return Ok((filename, declared, data));
    }

    Err(ApiError::Validation("No image provided".to_string()))
}

/// /auth/* endpoints
use crate::{
    account::{
        LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SelfView, SessionUser,
    },
    api::AppJson,
    auth::Actor,
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

/// Register endpoint
async fn register(
    State(ctx): State<AppContext>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let account = ctx
        .account_manager
        .create_account(req.name, req.username, req.email, req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id,
            name: account.name,
            username: account.username,
            email: account.email,
        }),
    ))
}

/// Login endpoint
async fn login(
    State(ctx): State<AppContext>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (account, token) = ctx.account_manager.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        user: SessionUser {
            id: account.id,
            name: account.name,
            username: account.username,
            email: account.email,
            profile_picture: account.profile_picture,
        },
        token,
    }))
}

/// Current account endpoint
async fn me(actor: Actor) -> Json<SelfView> {
    let account = actor.account;

    Json(SelfView {
        id: account.id,
        name: account.name,
        username: account.username,
        email: account.email,
        bio: account.bio,
        profile_picture: account.profile_picture,
        banner: account.banner,
        followers_count: account.followers.0.len(),
        following_count: account.following.0.len(),
    })
}

/// Logout endpoint
///
/// Tokens are stateless, so there is no server-side session to clear; the
/// client discards its token.
async fn logout(_actor: Actor) -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

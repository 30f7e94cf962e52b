//! Account endpoints
//!
//! Registration, login, the verification flow, profiles and the
//! follow toggle.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use super::dto::{FollowDto, UserDto, profile_dto};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser, TokenPair};
use crate::error::AppError;
use crate::service::{FollowToggle, ProfileUpdate, RegisterInput};

/// Create account router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/verify-email/", post(verify))
        .route("/resend-email/", post(resend))
        .route(
            "/profile/:id/",
            get(get_profile)
                .put(put_profile)
                .patch(patch_profile)
                .delete(delete_profile),
        )
        .route("/:user_id/follow/", post(toggle_follow))
        .route("/followers/:user_id/", get(followers))
        .route("/following/:user_id/", get(following))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    phone_number: String,
    password: String,
    confirm_password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let user = state
        .accounts
        .register(RegisterInput {
            username: req.username,
            email: req.email,
            phone_number: req.phone_number,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserDto::from(&user),
            "message": "Confirmation codes sent to your email and phone number",
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    /// Username, email or phone number
    identifier: String,
    password: String,
}

fn token_response(user: &crate::data::User, pair: TokenPair) -> Json<serde_json::Value> {
    Json(json!({
        "access": pair.access,
        "refresh": pair.refresh,
        "user": UserDto::from(user),
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (user, pair) = state.accounts.login(&req.identifier, &req.password).await?;
    Ok(token_response(&user, pair))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (user, pair) = state.accounts.refresh(&req.refresh).await?;
    Ok(token_response(&user, pair))
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    /// Email or phone number; selects the code channel
    identifier: String,
    code: String,
}

async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (user, pair) = state.accounts.verify(&req.identifier, &req.code).await?;
    Ok(token_response(&user, pair))
}

#[derive(Debug, Deserialize)]
struct ResendRequest {
    identifier: String,
}

async fn resend(
    State(state): State<AppState>,
    Json(req): Json<ResendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.accounts.resend_codes(&req.identifier).await?;
    Ok(Json(json!({
        "message": "Confirmation codes sent to your email and phone number",
    })))
}

// =============================================================================
// Profile
// =============================================================================

async fn get_profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<super::dto::ProfileDto>, AppError> {
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(profile_dto(&state, &user, viewer.as_ref()).await?))
}

#[derive(Debug, Deserialize)]
struct ProfileUpdateRequest {
    username: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    is_private: Option<bool>,
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(req: ProfileUpdateRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            phone_number: req.phone_number,
            first_name: req.first_name,
            last_name: req.last_name,
            is_private: req.is_private,
        }
    }
}

async fn put_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserDto>, AppError> {
    let user = state.accounts.update_profile(&actor, &id, req.into()).await?;
    Ok(Json(UserDto::from(&user)))
}

async fn patch_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserDto>, AppError> {
    let user = state.accounts.update_profile(&actor, &id, req.into()).await?;
    Ok(Json(UserDto::from(&user)))
}

async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_profile(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Follow
// =============================================================================

async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    match state.accounts.toggle_follow(&actor, &user_id).await? {
        FollowToggle::Added(follow) => Ok((
            StatusCode::CREATED,
            Json(json!({ "follow": FollowDto::from(follow) })),
        )
            .into_response()),
        FollowToggle::Removed => {
            Ok(Json(json!({ "message": "Unfollowed" })).into_response())
        }
    }
}

async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FollowDto>>, AppError> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let followers = state
        .db
        .followers_of(&user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(followers))
}

async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FollowDto>>, AppError> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let following = state
        .db
        .following_of(&user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(following))
}

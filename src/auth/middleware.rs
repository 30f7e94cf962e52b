//! Authentication middleware
//!
//! Protects routes that require authentication.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::tokens::{TokenKind, verify_token};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

/// Resolve a bearer token to its user row.
///
/// The token must be an access token; the account must still be
/// active and not soft-deleted.
async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let claims = verify_token(token, &state.config.auth.token_secret)?;

    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized);
    }

    let user = state
        .db
        .get_user(&claims.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = authenticate_token(&token, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error. Used by
/// read endpoints that enrich responses for known viewers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let app_state = AppState::from_ref(state);
        let user = match extract_bearer_token(&parts.headers) {
            Some(token) => authenticate_token(&token, &app_state).await.ok(),
            None => None,
        };

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}

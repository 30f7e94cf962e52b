//! Post endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use super::dto::{PostDto, post_dto};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{LikeToggle, PostInput};

/// Search filter shared by the list endpoints
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Create post router
///
/// Mounted under `/api/post`; comment and story routes are merged in
/// by the caller. Parameterized segments share the `:id` name so the
/// route tree stays conflict-free.
pub fn post_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/:id/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/user/:user_id/", get(list_user_posts))
        .route("/:id/like/", axum::routing::post(toggle_like))
}

#[derive(Debug, Deserialize)]
struct CreatePostRequest {
    description: String,
    #[serde(default)]
    photos: Vec<String>,
    #[serde(default)]
    videos: Vec<String>,
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<Response, AppError> {
    let mut media = Vec::new();
    for url in req.photos {
        media.push(("photo".to_string(), url));
    }
    for url in req.videos {
        media.push(("video".to_string(), url));
    }

    let post = state
        .content
        .create_post(
            &actor,
            PostInput {
                description: req.description,
                media,
            },
        )
        .await?;

    let dto = post_dto(&state, &post, Some(&actor)).await?;
    Ok((StatusCode::CREATED, Json(dto)).into_response())
}

async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PostDto>>, AppError> {
    let posts = state.db.list_posts(query.q.as_deref()).await?;

    let mut dtos = Vec::with_capacity(posts.len());
    for post in &posts {
        dtos.push(post_dto(&state, post, viewer.as_ref()).await?);
    }
    Ok(Json(dtos))
}

async fn list_user_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(user_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PostDto>>, AppError> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let posts = state
        .db
        .list_posts_by_user(&user.id, query.q.as_deref())
        .await?;

    let mut dtos = Vec::with_capacity(posts.len());
    for post in &posts {
        dtos.push(post_dto(&state, post, viewer.as_ref()).await?);
    }
    Ok(Json(dtos))
}

/// Detail fetch; every hit counts a view.
async fn get_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<PostDto>, AppError> {
    let post = state.content.view_post(&id).await?;
    Ok(Json(post_dto(&state, &post, viewer.as_ref()).await?))
}

#[derive(Debug, Deserialize)]
struct UpdatePostRequest {
    description: String,
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostDto>, AppError> {
    let post = state
        .content
        .update_post(&actor, &id, &req.description)
        .await?;
    Ok(Json(post_dto(&state, &post, Some(&actor)).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.content.delete_post(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state
        .content
        .toggle_like(&actor, crate::data::LikeTarget::Post, &id)
        .await?
    {
        LikeToggle::Added(like) => Ok((
            StatusCode::CREATED,
            Json(json!({ "like": super::dto::LikeDto::from(like) })),
        )
            .into_response()),
        LikeToggle::Removed => Ok(Json(json!({ "message": "Unliked" })).into_response()),
    }
}

//! Comment endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use super::dto::{CommentDetailDto, CommentDto, comment_dto};
use super::posts::SearchQuery;
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::LikeToggle;

/// Create comment router, merged into the `/api/post` tree.
pub fn comment_router() -> Router<AppState> {
    Router::new()
        .route("/comment/", get(list_comments))
        .route("/:id/comment/", get(list_post_comments).post(create_comment))
        .route(
            "/comment/:id/",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/comment/:id/like/", axum::routing::post(toggle_like))
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CommentDto>>, AppError> {
    let comments = state
        .db
        .list_comments(query.q.as_deref())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(comments))
}

async fn list_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CommentDto>>, AppError> {
    let post = state
        .db
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    let comments = state
        .db
        .comments_by_post(&post.id, query.q.as_deref())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    body: String,
}

async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, AppError> {
    let comment = state
        .content
        .create_comment(&actor, &post_id, &req.body)
        .await?;

    let dto = comment_dto(&state, &comment, Some(&actor)).await?;
    Ok((StatusCode::CREATED, Json(dto)).into_response())
}

async fn get_comment(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<CommentDetailDto>, AppError> {
    let comment = state
        .db
        .get_comment(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    Ok(Json(comment_dto(&state, &comment, viewer.as_ref()).await?))
}

async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<CommentDetailDto>, AppError> {
    let comment = state.content.update_comment(&actor, &id, &req.body).await?;
    Ok(Json(comment_dto(&state, &comment, Some(&actor)).await?))
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.content.delete_comment(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state
        .content
        .toggle_like(&actor, crate::data::LikeTarget::Comment, &id)
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

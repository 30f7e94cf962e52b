//! Story endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use super::dto::{StoryDto, story_dto};
use super::posts::SearchQuery;
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{LikeToggle, StoryInput};

/// Create story router, merged into the `/api/post` tree.
pub fn story_router() -> Router<AppState> {
    Router::new()
        .route("/story/", get(list_stories).post(create_story))
        .route(
            "/story/:id/",
            get(get_story).put(update_story).delete(delete_story),
        )
        .route("/story/:id/like/", axum::routing::post(toggle_like))
}

#[derive(Debug, Deserialize)]
struct CreateStoryRequest {
    description: String,
    photo_url: Option<String>,
    video_url: Option<String>,
}

async fn create_story(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateStoryRequest>,
) -> Result<Response, AppError> {
    let story = state
        .content
        .create_story(
            &actor,
            StoryInput {
                description: req.description,
                photo_url: req.photo_url,
                video_url: req.video_url,
            },
        )
        .await?;

    let dto = story_dto(&state, &story, Some(&actor)).await?;
    Ok((StatusCode::CREATED, Json(dto)).into_response())
}

async fn list_stories(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StoryDto>>, AppError> {
    let stories = state.db.list_stories(query.q.as_deref()).await?;

    let mut dtos = Vec::with_capacity(stories.len());
    for story in &stories {
        dtos.push(story_dto(&state, story, viewer.as_ref()).await?);
    }
    Ok(Json(dtos))
}

/// Detail fetch; every hit counts a view.
async fn get_story(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<StoryDto>, AppError> {
    let story = state.content.view_story(&id).await?;
    Ok(Json(story_dto(&state, &story, viewer.as_ref()).await?))
}

#[derive(Debug, Deserialize)]
struct UpdateStoryRequest {
    description: Option<String>,
    photo_url: Option<String>,
    video_url: Option<String>,
}

async fn update_story(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStoryRequest>,
) -> Result<Json<StoryDto>, AppError> {
    let story = state
        .content
        .update_story(
            &actor,
            &id,
            req.description.as_deref(),
            req.photo_url.as_deref(),
            req.video_url.as_deref(),
        )
        .await?;
    Ok(Json(story_dto(&state, &story, Some(&actor)).await?))
}

async fn delete_story(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.content.delete_story(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state
        .content
        .toggle_like(&actor, crate::data::LikeTarget::Story, &id)
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

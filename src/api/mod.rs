//! API layer
//!
//! HTTP handlers for:
//! - Account endpoints (`/api/auth`)
//! - Content endpoints (`/api/post`, including comments and stories)
//! - Metrics (Prometheus)

mod accounts;
mod comments;
mod dto;
pub mod metrics;
mod posts;
mod stories;

pub use dto::*;

pub use accounts::auth_router;
pub use metrics::metrics_router;

use axum::Router;

use crate::AppState;

/// Create the content router mounted under `/api/post`.
///
/// Posts live at the root of this tree; comments and stories hang off
/// their own prefixes as the clients expect.
pub fn content_router() -> Router<AppState> {
    posts::post_router()
        .merge(comments::comment_router())
        .merge(stories::story_router())
}

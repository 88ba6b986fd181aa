use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use confbook_core::{
    comment::Comment,
    config::Environment,
    types::CommentId,
    workflow::{CommentTransition, CommentWorkflow, StateMachine},
};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub reject: Option<String>,
}

impl ReviewQuery {
    /// Any non-empty `reject` other than `0` rejects the comment
    pub fn accepted(&self) -> bool {
        !matches!(self.reject.as_deref(), Some(v) if !v.is_empty() && v != "0")
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub transition: CommentTransition,
    pub comment: Comment,
    /// Transitions still possible from the new state
    pub next_transitions: Vec<CommentTransition>,
}

pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let id = CommentId::from_string(&id)?;
    let accepted = query.accepted();

    let service = state.comments.clone();
    let review = blocking(move || service.review(&id, accepted)).await?;

    // Published comments show up on cached pages
    state.cache.purge_all();

    Ok(Json(ReviewResponse {
        transition: review.transition,
        next_transitions: CommentWorkflow::enabled(review.comment.state()),
        comment: review.comment,
    }))
}

/// Handles the `PURGE` method; anything else is not allowed here
pub async fn purge_http_cache(
    State(state): State<AppState>,
    method: Method,
    Path(uri): Path<String>,
) -> Response {
    if method.as_str() != "PURGE" {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    if state.config.server.environment == Environment::Prod {
        return (StatusCode::BAD_REQUEST, "KO").into_response();
    }

    let path = format!("/{}", uri.trim_start_matches('/'));
    state.cache.purge(&path);
    tracing::info!("Purged {} from page cache", path);
    (StatusCode::OK, "Done").into_response()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/comment/review/{id}", get(review))
        .route("/admin/http-cache/{*uri}", any(purge_http_cache))
}

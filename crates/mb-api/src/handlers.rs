//! # mb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! `BoardService`. Absent fields are passed down as empty strings; the
//! service decides whether that is a validation failure or a lookup miss.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mb_core::BoardService;
use serde::Deserialize;
use serde_json::json;

use crate::extract::{lenient_string, Payload};
use crate::response::{self, ApiError};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BoardService>,
}

impl AppState {
    pub fn new(service: BoardService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewThread {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delete_password: Option<String>,
    /// Overrides the board named in the path.
    #[serde(default, deserialize_with = "lenient_string")]
    pub board: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadTarget {
    #[serde(default, deserialize_with = "lenient_string")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delete_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewReply {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delete_password: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplyTarget {
    #[serde(default, deserialize_with = "lenient_string")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reply_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delete_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadQuery {
    #[serde(default, deserialize_with = "lenient_string")]
    pub thread_id: Option<String>,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// POST /api/threads/{board}
pub async fn create_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<NewThread>,
) -> Result<Response, ApiError> {
    let board = form.board.as_deref().filter(|b| !b.is_empty()).unwrap_or(&board);

    let thread = state
        .service
        .create_thread(board, field(&form.text), field(&form.delete_password))
        .await
        .map_err(ApiError::with(&response::THREAD_CREATE))?;

    Ok(Json(thread).into_response())
}

/// GET /api/threads/{board}
pub async fn list_threads(
    State(state): State<AppState>,
    Path(board): Path<String>,
) -> Result<Response, ApiError> {
    let threads = state
        .service
        .list_threads(&board)
        .await
        .map_err(ApiError::with(&response::THREAD_LIST))?;

    Ok(Json(threads).into_response())
}

/// PUT /api/threads/{board}
pub async fn report_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<ThreadTarget>,
) -> Result<Response, ApiError> {
    state
        .service
        .report_thread(&board, field(&form.thread_id))
        .await
        .map_err(ApiError::with(&response::THREAD_REPORT))?;

    Ok(response::REPORTED.into_response())
}

/// DELETE /api/threads/{board}
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<ThreadTarget>,
) -> Result<Response, ApiError> {
    state
        .service
        .delete_thread(&board, field(&form.thread_id), field(&form.delete_password))
        .await
        .map_err(ApiError::with(&response::THREAD_DELETE))?;

    Ok(response::SUCCESS.into_response())
}

/// POST /api/replies/{board}
pub async fn create_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<NewReply>,
) -> Result<Response, ApiError> {
    let document = state
        .service
        .create_reply(
            &board,
            field(&form.thread_id),
            field(&form.text),
            field(&form.delete_password),
        )
        .await
        .map_err(ApiError::with(&response::REPLY_CREATE))?;

    Ok(Json(document).into_response())
}

/// GET /api/replies/{board}?thread_id=...
pub async fn get_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> Result<Response, ApiError> {
    let thread = state
        .service
        .thread_with_replies(&board, field(&query.thread_id))
        .await
        .map_err(ApiError::with(&response::REPLY_GET))?;

    Ok(Json(thread).into_response())
}

/// PUT /api/replies/{board}
pub async fn report_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<ReplyTarget>,
) -> Result<Response, ApiError> {
    state
        .service
        .report_reply(&board, field(&form.thread_id), field(&form.reply_id))
        .await
        .map_err(ApiError::with(&response::REPLY_REPORT))?;

    Ok(response::REPORTED.into_response())
}

/// DELETE /api/replies/{board}
pub async fn delete_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    Payload(form): Payload<ReplyTarget>,
) -> Result<Response, ApiError> {
    state
        .service
        .delete_reply(
            &board,
            field(&form.thread_id),
            field(&form.reply_id),
            field(&form.delete_password),
        )
        .await
        .map_err(ApiError::with(&response::REPLY_DELETE))?;

    Ok(response::SUCCESS.into_response())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

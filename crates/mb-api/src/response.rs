//! # Legacy response wording
//!
//! Existing clients expect lookup misses, validation failures, and bad
//! passwords to arrive as `200 OK` with a human-readable payload, and each
//! endpoint words its misses differently. Store failures are the only
//! outcome that leaves the 2xx range.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mb_core::error::{AppError, Resource};
use serde_json::json;

/// A `200 OK` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// JSON string body, e.g. `"--board not found--"`.
    Json(&'static str),
    /// JSON object body `{"error": ...}`.
    Error(&'static str),
    /// Plain text body, e.g. `success`.
    Text(&'static str),
}

impl IntoResponse for Notice {
    fn into_response(self) -> Response {
        match self {
            Notice::Json(message) => (StatusCode::OK, Json(message)).into_response(),
            Notice::Error(message) => {
                (StatusCode::OK, Json(json!({ "error": message }))).into_response()
            }
            Notice::Text(message) => (StatusCode::OK, message).into_response(),
        }
    }
}

pub const SUCCESS: Notice = Notice::Text("success");
pub const REPORTED: Notice = Notice::Text("reported");
pub const INCORRECT_PASSWORD: Notice = Notice::Text("incorrect password");

/// How one endpoint words each failure.
#[derive(Debug, Clone, Copy)]
pub struct Wording {
    pub invalid: Notice,
    pub board: Notice,
    pub thread: Notice,
    pub reply: Notice,
}

const BASE: Wording = Wording {
    invalid: Notice::Json("-missing required fields--"),
    board: Notice::Json("--board not found--"),
    thread: Notice::Json("--thread not found--"),
    reply: Notice::Json("--reply not found--"),
};

pub const THREAD_CREATE: Wording = BASE;

pub const THREAD_LIST: Wording = Wording {
    board: Notice::Json("--no board with this name"),
    ..BASE
};

pub const THREAD_REPORT: Wording = BASE;

pub const THREAD_DELETE: Wording = Wording {
    board: Notice::Json("not found board"),
    thread: Notice::Json("not found thread"),
    ..BASE
};

pub const REPLY_CREATE: Wording = Wording {
    thread: Notice::Error("could't find thread check your thread_id"),
    ..BASE
};

pub const REPLY_GET: Wording = Wording {
    invalid: Notice::Json("--thread_id is required--"),
    board: Notice::Json("--no board with this name"),
    ..BASE
};

pub const REPLY_REPORT: Wording = BASE;

pub const REPLY_DELETE: Wording = BASE;

/// A service failure paired with the wording of the endpoint that hit it.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    wording: &'static Wording,
}

impl ApiError {
    pub fn new(error: AppError, wording: &'static Wording) -> Self {
        Self { error, wording }
    }

    /// Adapter for `map_err`.
    pub fn with(wording: &'static Wording) -> impl Fn(AppError) -> Self {
        move |error| Self::new(error, wording)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error {
            AppError::ValidationError(reason) => {
                tracing::debug!(%reason, "request rejected");
                self.wording.invalid.into_response()
            }
            AppError::NotFound(Resource::Board) => self.wording.board.into_response(),
            AppError::NotFound(Resource::Thread) => self.wording.thread.into_response(),
            AppError::NotFound(Resource::Reply) => self.wording.reply.into_response(),
            AppError::IncorrectPassword => INCORRECT_PASSWORD.into_response(),
            AppError::Internal(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    })),
                )
                    .into_response()
            }
        }
    }
}

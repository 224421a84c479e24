//! # mb-api
//!
//! The web routing and orchestration layer for the message board.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;

use axum::routing::get;
use axum::Router;

pub use handlers::AppState;

/// Builds the full application router with middleware applied.
///
/// # Developer Note
/// The board segment is matched per route so the binary can nest the
/// whole router under another prefix if needed (e.g., /v1/).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/threads/{board}",
            get(handlers::list_threads)
                .post(handlers::create_thread)
                .put(handlers::report_thread)
                .delete(handlers::delete_thread),
        )
        .route(
            "/api/replies/{board}",
            get(handlers::get_thread)
                .post(handlers::create_reply)
                .put(handlers::report_reply)
                .delete(handlers::delete_reply),
        )
        .route("/health", get(handlers::health))
        .layer(middleware::propagate_request_id())
        .layer(middleware::trace_layer())
        .layer(middleware::set_request_id())
        .layer(middleware::cors_policy())
        .with_state(state)
}

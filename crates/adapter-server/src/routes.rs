//! Route definitions for the adapter API.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

/// Create the adapter router for one run
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", openai_routes())
        .nest("/admin", admin_routes())
        .with_state(state)
}

/// OpenAI-compatible API routes
fn openai_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/completions", post(handlers::chat_completion))
        .route("/models", get(handlers::list_models))
}

/// Operator-facing routes
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(handlers::recent_logs))
        .route("/probe", post(handlers::execute_probe))
        .route("/probe/docs", get(handlers::probe_docs))
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::optimization::handlers as optimization;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route(
            "/api/v1/session",
            get(session::handle_get_session).delete(session::handle_end_session),
        )
        .route(
            "/api/v1/session/credentials",
            put(session::handle_set_credentials),
        )
        .route(
            "/api/v1/resume",
            post(session::handle_upload_resume)
                .get(session::handle_preview_resume)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/history", get(session::handle_get_history))
        // Optimization
        .route("/api/v1/focuses", get(optimization::handle_list_focuses))
        .route("/api/v1/optimize", post(optimization::handle_optimize))
        .with_state(state)
}

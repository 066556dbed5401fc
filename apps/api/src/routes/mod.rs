pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::sessions::{handlers, ws};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Live interview
        .route("/ws", get(ws::handle_ws))
        // Sessions API
        .route("/api/v1/setup", post(handlers::handle_setup))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:id/transcript",
            get(handlers::handle_download_transcript),
        )
        .route("/api/v1/sessions/:id/review", post(handlers::handle_review))
        .with_state(state)
}

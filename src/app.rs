use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/reading/recent", get(handlers::get_recent))
        .route("/api/reading/repair", post(handlers::repair))
        .route(
            "/api/reading/:owner_id/:state_id",
            get(handlers::get_reading_state).delete(handlers::delete_reading_state),
        )
        .route(
            "/api/reading/:owner_id/:state_id/progress",
            post(handlers::update_progress),
        )
        .route("/api/stats", get(handlers::get_stats))
        .with_state(state)
}

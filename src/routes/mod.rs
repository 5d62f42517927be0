use axum::routing::get;
use axum::Router;

use crate::app_state::AppState;

pub mod auth;
pub mod health;
pub mod images;
pub mod jobs;
pub mod metrics;

/// Health check and the job/image API, bound to `state`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/job/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/api/job/{id}/", get(jobs::get_job))
        .route("/api/image/{id}/", get(images::get_image))
        .with_state(state)
}

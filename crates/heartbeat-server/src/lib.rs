//! heartbeat-server -- the HTTP edge: accepts heartbeat samples over
//! `POST /metrics/heart-rate` and serves aggregated queries over
//! `GET /metrics/heart-rate`, plus a `/health` probe.

mod error;
mod handlers;
mod state;

pub use error::AppError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics/heart-rate", post(handlers::enqueue_heartbeat).get(handlers::get_heart_rate))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

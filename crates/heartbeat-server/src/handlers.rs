//! HTTP handlers: enqueue a heartbeat, query aggregated heart-rate data,
//! and the health probe.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use heartbeat_core::producer::build_queue_item;
use heartbeat_reader::{query_heart_rate, QueryParams};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HeartbeatPayload {
    pub device_id: String,
    pub user_id: String,
    pub timestamp: String,
    pub heart_rate: i32,
}

/// POST /metrics/heart-rate -- validates and enqueues one sample.
pub(crate) async fn enqueue_heartbeat(
    State(state): State<AppState>,
    Json(payload): Json<HeartbeatPayload>,
) -> Result<Response, AppError> {
    counter!("heartbeat.ingest.requests", 1);

    let item = build_queue_item(payload.device_id, payload.user_id, &payload.timestamp, payload.heart_rate)
        .map_err(AppError::unprocessable)?;
    let user_id = item.user_id.clone();

    state.queue.push(&item).await.map_err(AppError::internal)?;
    counter!("heartbeat.ingest.enqueued", 1);

    Ok((StatusCode::OK, Json(json!({ "status": "accepted", "user_id": user_id }))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct HeartRateQuery {
    pub user_id: String,
    pub start: String,
    pub end: String,
    pub device_id: Option<String>,
}

/// GET /metrics/heart-rate -- per-minute aggregated heart-rate data for a
/// user across `[start, end)`.
pub(crate) async fn get_heart_rate(
    State(state): State<AppState>,
    Query(params): Query<HeartRateQuery>,
) -> Result<Response, AppError> {
    let start = Instant::now();
    counter!("heartbeat.query.requests", 1);

    let start_ms = heartbeat_core::clock::parse_iso8601_to_epoch_ms(&params.start)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("invalid start timestamp: {e}")))?;
    let end_ms = heartbeat_core::clock::parse_iso8601_to_epoch_ms(&params.end)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("invalid end timestamp: {e}")))?;

    if start_ms >= end_ms {
        return Err(AppError::bad_request(anyhow::anyhow!("start must be before end")));
    }

    let query = QueryParams {
        user_id: &params.user_id,
        start_ms,
        end_ms,
        device_id: params.device_id.as_deref(),
    };
    let rows = query_heart_rate(&state.layout, &query).map_err(AppError::internal)?;
    histogram!("heartbeat.query.latency_ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(Json(json!({
        "user_id": params.user_id,
        "count": rows.len(),
        "data": rows,
    }))
    .into_response())
}

/// GET /health -- service liveness plus independent queue and storage
/// checks, 503 if any fails.
pub(crate) async fn health_check(State(state): State<AppState>) -> Response {
    let service = true;

    let queue = match state.queue.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: queue ping failed");
            false
        }
    };

    let storage = match probe_storage_writable(&state) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: storage probe failed");
            false
        }
    };

    let status = if service && queue && storage { "healthy" } else { "unhealthy" };
    let body = Json(json!({
        "status": status,
        "checks": { "service": service, "queue": queue, "storage": storage },
    }));

    let code = if status == "healthy" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, body).into_response()
}

/// Proves the data directory is actually writable by writing then
/// removing a probe file, rather than just creating the directory.
fn probe_storage_writable(state: &AppState) -> std::io::Result<()> {
    let dir = state.layout.data_dir();
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".heartbeat-health-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}

//! Operational HTTP endpoints.
//!
//! - `/health`             : status summary (JSON)
//! - `/health/live`        : liveness
//! - `/health/ready`       : readiness (503 when draining)
//! - `/metrics`            : JSON snapshot
//! - `/metrics/prometheus` : Prometheus text format
//!
//! `record_requests` is the middleware that feeds every served request back
//! into the aggregator.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app_state::AppState;
use crate::export;

/// Requests slower than this are logged at warn.
pub const SLOW_REQUEST_MS: f64 = 1_000.0;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let agg = state.aggregator();
    Json(json!({
        "status": "healthy",
        "timestamp": agg.now_ms(),
        "uptime": state.uptime_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}

pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not ready" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    }
}

pub async fn metrics_json(State(state): State<AppState>) -> Response {
    let agg = state.aggregator();
    let snapshot = agg.snapshot();
    match export::json::render(agg.now_ms(), &snapshot) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "metrics json export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn metrics_prometheus(State(state): State<AppState>) -> Response {
    let snapshot = state.aggregator().snapshot();
    let body = export::prometheus::render(&snapshot);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, export::prometheus::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

pub async fn record_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let res = next.run(req).await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
    let status = res.status();
    state
        .aggregator()
        .record_request(status.as_u16() < 400, elapsed_ms, &path, &method);

    if status.as_u16() >= 400 {
        tracing::warn!(%method, %path, status = status.as_u16(), elapsed_ms, "request completed with error");
    } else {
        tracing::debug!(%method, %path, status = status.as_u16(), elapsed_ms, "request completed");
    }
    if elapsed_ms > SLOW_REQUEST_MS {
        tracing::warn!(%method, %path, elapsed_ms, threshold_ms = SLOW_REQUEST_MS, "slow request detected");
    }
    res
}

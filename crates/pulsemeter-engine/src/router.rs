//! Axum router wiring.
//!
//! Every route passes through `ops::record_requests`; the exporter and health
//! routes are technical endpoints, so the aggregator drops them again.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health))
        .route("/health/live", get(ops::live))
        .route("/health/ready", get(ops::ready))
        .route("/metrics", get(ops::metrics_json))
        .route("/metrics/prometheus", get(ops::metrics_prometheus))
        .layer(middleware::from_fn_with_state(state.clone(), ops::record_requests))
        .with_state(state)
}

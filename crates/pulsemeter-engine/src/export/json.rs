//! JSON rendering of a snapshot.

use serde::Serialize;

use pulsemeter_core::error::{MeterError, Result};
use pulsemeter_core::Metrics;

/// Response body of `GET /metrics`.
#[derive(Debug, Serialize)]
pub struct MetricsDocument<'a> {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub metrics: &'a Metrics,
}

pub fn render(timestamp_ms: u64, m: &Metrics) -> Result<String> {
    serde_json::to_string(&MetricsDocument { timestamp: timestamp_ms, metrics: m })
        .map_err(|e| MeterError::Internal(format!("encode metrics failed: {e}")))
}

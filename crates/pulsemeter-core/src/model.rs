//! The `Metrics` aggregate and its category structures.
//!
//! `Metrics::default()` is the zero value the engine starts from and returns to
//! on reset. Fields named `*_rate` / `*_trend` are derived by the engine; nothing
//! outside it writes them. JSON names are camelCase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Full point-in-time view of every metric category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub requests: RequestMetrics,
    pub errors: ErrorMetrics,
    pub performance: PerformanceMetrics,
    pub security: SecurityMetrics,
    pub business: BusinessMetrics,
    pub websocket: WebsocketMetrics,
    pub time_series: TimeSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub by_endpoint: BTreeMap<String, u64>,
    pub by_method: BTreeMap<String, u64>,
    /// Running mean over every recorded request, in milliseconds.
    pub average_response_time: f64,
    pub response_time_histogram: ResponseTimeHistogram,
    /// Requests per second over the sliding window.
    pub request_rate: f64,
    /// Failed / total.
    pub error_rate: f64,
}

/// Percentiles over the most recent response-time samples (milliseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeHistogram {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetrics {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_endpoint: BTreeMap<String, u64>,
    /// Errors per second over the sliding window.
    pub error_rate: f64,
    pub error_trend: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Resident memory of the process, in bytes.
    pub memory_usage: u64,
    /// CPU seconds consumed since the previous refresh.
    pub cpu_usage: f64,
    /// Active database connections.
    pub active_connections: u64,
    pub database_connections: DatabaseConnections,
    pub active_queries: u64,
    pub slow_queries: u64,
    /// Average query time reported by the database, in milliseconds.
    pub query_time: f64,
    pub query_rate: f64,
    pub memory_trend: f64,
    pub cpu_trend: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConnections {
    pub active: u64,
    pub busy: u64,
    pub total: u64,
    pub idle: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    pub failed_logins: u64,
    pub suspicious_requests: u64,
    pub blocked_requests: u64,
    pub rate_limit_hits: u64,
    pub failed_login_rate: f64,
    pub security_event_rate: f64,
}

impl SecurityMetrics {
    pub fn total_events(&self) -> u64 {
        self.failed_logins + self.suspicious_requests + self.blocked_requests + self.rate_limit_hits
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub active_offers: u64,
    pub completed_offers: u64,
    pub active_invoices: u64,
    pub pending_tasks: u64,
    pub completed_tasks: u64,
    pub active_users: u64,
    pub file_uploads: u64,
    pub offer_creation_rate: f64,
    pub offer_completion_rate: f64,
    pub task_completion_rate: f64,
    pub user_activity_rate: f64,
    pub file_upload_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsocketMetrics {
    /// Open connections; never below zero.
    pub active_connections: u64,
    pub total_connections: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub connection_errors: u64,
    pub message_rate: f64,
    pub connection_rate: f64,
}

/// Parallel sample arrays; every array has the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    /// Milliseconds since the Unix epoch.
    pub timestamps: Vec<u64>,
    pub request_rates: Vec<f64>,
    pub response_times: Vec<f64>,
    pub error_rates: Vec<f64>,
    pub memory_usage: Vec<f64>,
    pub cpu_usage: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn json_uses_camel_case_names() {
        let mut m = Metrics::default();
        m.requests.by_endpoint.insert("/api/client".into(), 2);
        m.requests.response_time_histogram.p99 = 12.5;

        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["requests"]["byEndpoint"]["/api/client"], 2);
        assert_eq!(v["requests"]["responseTimeHistogram"]["p99"], 12.5);
        assert!(v["timeSeries"]["requestRates"].is_array());
        assert_eq!(v["websocket"]["activeConnections"], 0);
    }

    #[test]
    fn security_total_sums_all_counters() {
        let s = SecurityMetrics {
            failed_logins: 1,
            suspicious_requests: 2,
            blocked_requests: 3,
            rate_limit_hits: 4,
            ..Default::default()
        };
        assert_eq!(s.total_events(), 10);
    }
}

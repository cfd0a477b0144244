//! Collaborator pull contracts consumed by the refresh scheduler.
//!
//! Gauge types carry no rate fields; rates are owned by the aggregator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pulsemeter_core::error::Result;

/// Database pool and query figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseGauges {
    pub active_connections: u64,
    pub busy_connections: u64,
    pub total_connections: u64,
    pub idle_connections: u64,
    pub active_queries: u64,
    pub slow_queries: u64,
    pub average_query_time_ms: f64,
    /// Cumulative queries served by the database; the query rate is derived
    /// from its growth between refreshes.
    pub total_queries: u64,
}

/// Business counts read from the domain store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessGauges {
    pub active_offers: u64,
    pub completed_offers: u64,
    pub active_invoices: u64,
    pub pending_tasks: u64,
    pub completed_tasks: u64,
    pub active_users: u64,
    pub file_uploads: u64,
}

/// Local process resource usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessSample {
    pub memory_bytes: u64,
    /// CPU seconds consumed since the previous sample.
    pub cpu_seconds: f64,
}

#[async_trait]
pub trait DatabaseMetricsProvider: Send + Sync {
    fn name(&self) -> &'static str {
        "database"
    }
    async fn connection_metrics(&self) -> Result<DatabaseGauges>;
}

#[async_trait]
pub trait BusinessMetricsProvider: Send + Sync {
    fn name(&self) -> &'static str {
        "business"
    }
    async fn business_metrics(&self) -> Result<BusinessGauges>;
}

/// Samples the local process. Called from the refresh tick only.
pub trait ProcessProbe: Send {
    fn sample(&mut self) -> Result<ProcessSample>;
}

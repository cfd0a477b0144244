//! Background refresh ticks.
//!
//! Three independent interval loops share the aggregator:
//! - refresh (30s): process probe, database + business collaborators, one
//!   time-series point, trend recompute, `Refreshed` notification
//! - evict (60s): age-based time-series eviction
//! - audit (1h): full snapshot to the log and to subscribers
//!
//! Collaborator calls run outside the aggregator lock and are bounded by
//! `collaborator_timeout_ms`. A failed call is logged and leaves the previous
//! gauges in place; no tick failure ever ends its loop. Loops stop when the
//! `SchedulerHandle` is stopped or dropped.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use pulsemeter_core::error::{MeterError, Result};

use super::providers::{BusinessMetricsProvider, DatabaseMetricsProvider, ProcessProbe};
use crate::aggregate::{MetricsAggregator, MetricsEvent};
use crate::config::SchedulerSection;

#[async_trait]
trait Tick: Send {
    fn name(&self) -> &'static str;
    async fn tick(&mut self);
}

pub struct RefreshScheduler {
    aggregator: Arc<MetricsAggregator>,
    settings: SchedulerSection,
    database: Option<Arc<dyn DatabaseMetricsProvider>>,
    business: Option<Arc<dyn BusinessMetricsProvider>>,
    probe: Option<Box<dyn ProcessProbe>>,
}

impl RefreshScheduler {
    /// Settings are used as given; periods below 1 ms are raised to 1 ms.
    /// Load them through `config` to get range validation.
    pub fn new(aggregator: Arc<MetricsAggregator>, settings: SchedulerSection) -> Self {
        Self {
            aggregator,
            settings,
            database: None,
            business: None,
            probe: None,
        }
    }

    pub fn with_database(mut self, provider: Arc<dyn DatabaseMetricsProvider>) -> Self {
        self.database = Some(provider);
        self
    }

    pub fn with_business(mut self, provider: Arc<dyn BusinessMetricsProvider>) -> Self {
        self.business = Some(provider);
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn ProcessProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Spawn the three tick loops on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let s = &self.settings;

        let refresh = RefreshTick {
            aggregator: Arc::clone(&self.aggregator),
            database: self.database,
            business: self.business,
            probe: self.probe,
            timeout: Duration::from_millis(s.collaborator_timeout_ms),
        };
        let evict = EvictTick {
            aggregator: Arc::clone(&self.aggregator),
            retention_ms: self.aggregator.settings().time_series_retention_ms,
        };
        let audit = AuditTick {
            aggregator: Arc::clone(&self.aggregator),
        };

        let tasks = vec![
            tokio::spawn(run_loop(refresh, Duration::from_millis(s.refresh_interval_ms), true, stop_rx.clone())),
            tokio::spawn(run_loop(evict, Duration::from_millis(s.eviction_interval_ms), false, stop_rx.clone())),
            tokio::spawn(run_loop(audit, Duration::from_millis(s.audit_interval_ms), false, stop_rx)),
        ];

        tracing::info!(
            refresh_ms = s.refresh_interval_ms,
            eviction_ms = s.eviction_interval_ms,
            audit_ms = s.audit_interval_ms,
            "refresh scheduler started"
        );
        SchedulerHandle { stop_tx, tasks }
    }
}

/// Owns the running tick loops. Dropping it aborts them.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal every loop to stop and wait for them to finish.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        tracing::info!("refresh scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Shortest tick period; `interval_at` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

async fn run_loop(mut task: impl Tick, period: Duration, immediate: bool, mut stop: watch::Receiver<bool>) {
    let period = period.max(MIN_PERIOD);
    let start = if immediate { Instant::now() } else { Instant::now() + period };
    let mut interval = time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => task.tick().await,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!(task = task.name(), "tick loop stopped");
}

async fn bounded<T>(name: &'static str, limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match time::timeout(limit, fut).await {
        Ok(r) => r,
        Err(_) => Err(MeterError::Timeout(name)),
    }
}

fn log_collaborator_failure(name: &'static str, e: &MeterError) {
    tracing::warn!(collaborator = name, code = e.code().as_str(), error = %e, "collaborator refresh failed; keeping last values");
}

struct RefreshTick {
    aggregator: Arc<MetricsAggregator>,
    database: Option<Arc<dyn DatabaseMetricsProvider>>,
    business: Option<Arc<dyn BusinessMetricsProvider>>,
    probe: Option<Box<dyn ProcessProbe>>,
    timeout: Duration,
}

#[async_trait]
impl Tick for RefreshTick {
    fn name(&self) -> &'static str {
        "refresh"
    }

    async fn tick(&mut self) {
        let agg = &self.aggregator;

        if let Some(probe) = self.probe.as_mut() {
            match probe.sample() {
                Ok(s) => agg.update_process(s),
                Err(e) => tracing::warn!(error = %e, "process sample failed"),
            }
        }

        let limit = self.timeout;
        let (database, business) = (&self.database, &self.business);
        let db = async {
            match database {
                Some(p) => Some((p.name(), bounded(p.name(), limit, p.connection_metrics()).await)),
                None => None,
            }
        };
        let biz = async {
            match business {
                Some(p) => Some((p.name(), bounded(p.name(), limit, p.business_metrics()).await)),
                None => None,
            }
        };
        let (db, biz) = future::join(db, biz).await;

        match db {
            Some((_, Ok(g))) => agg.merge_database(g),
            Some((name, Err(e))) => log_collaborator_failure(name, &e),
            None => {}
        }
        match biz {
            Some((_, Ok(g))) => agg.merge_business(g),
            Some((name, Err(e))) => log_collaborator_failure(name, &e),
            None => {}
        }

        agg.sample_time_series();

        if agg.has_subscribers() {
            agg.publish(MetricsEvent::Refreshed(Arc::new(agg.snapshot())));
        }
        tracing::debug!("metrics refreshed");
    }
}

struct EvictTick {
    aggregator: Arc<MetricsAggregator>,
    retention_ms: u64,
}

#[async_trait]
impl Tick for EvictTick {
    fn name(&self) -> &'static str {
        "evict"
    }

    async fn tick(&mut self) {
        let cutoff = self.aggregator.now_ms().saturating_sub(self.retention_ms);
        let removed = self.aggregator.evict_older_than(cutoff);
        if removed > 0 {
            tracing::debug!(removed, cutoff_ms = cutoff, "evicted stale time-series points");
        }
    }
}

struct AuditTick {
    aggregator: Arc<MetricsAggregator>,
}

#[async_trait]
impl Tick for AuditTick {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn tick(&mut self) {
        let m = Arc::new(self.aggregator.snapshot());
        tracing::info!(
            requests_total = m.requests.total,
            requests_failed = m.requests.failed,
            average_response_ms = m.requests.average_response_time,
            errors_total = m.errors.total,
            memory_bytes = m.performance.memory_usage,
            security_events = m.security.total_events(),
            ws_active = m.websocket.active_connections,
            "metrics audit"
        );
        self.aggregator.publish(MetricsEvent::Audit(m));
    }
}

//! Shared application state and composition root.
//!
//! The aggregator is built here from validated config and handed out as an
//! `Arc`; there is no process-wide singleton.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pulsemeter_core::error::Result;

use crate::aggregate::MetricsAggregator;
use crate::clock::{Clock, SystemClock};
use crate::config::MeterConfig;
use crate::refresh::RefreshScheduler;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: MeterConfig,
    aggregator: Arc<MetricsAggregator>,
    started: Instant,
    draining: AtomicBool,
}

impl AppState {
    /// Build application state from a config.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: MeterConfig) -> Result<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: MeterConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        cfg.validate()?;
        let aggregator = Arc::new(MetricsAggregator::new(cfg.engine.clone(), clock));
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                aggregator,
                started: Instant::now(),
                draining: AtomicBool::new(false),
            }),
        })
    }

    pub fn cfg(&self) -> &MeterConfig {
        &self.inner.cfg
    }

    pub fn aggregator(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.inner.aggregator)
    }

    /// Scheduler bound to this state's aggregator; collaborators are attached
    /// by the caller before `start()`.
    pub fn scheduler(&self) -> RefreshScheduler {
        RefreshScheduler::new(self.aggregator(), self.inner.cfg.scheduler.clone())
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.started.elapsed().as_secs_f64()
    }

    pub fn begin_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}

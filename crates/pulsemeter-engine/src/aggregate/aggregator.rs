//! The metrics aggregator.
//!
//! One coarse mutex guards the whole aggregate: counters, maps, both rate
//! windows, the response-time sampler and the time-series buffer. Every
//! `record_*` holds it for O(1) amortized work (the percentile sort is bounded
//! by the sampler capacity). Logging and subscriber fan-out happen after the
//! guard is dropped.
//!
//! Recording never fails and never panics the caller: a poisoned lock is
//! recovered and recording continues on the inner state.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use pulsemeter_core::model::{BusinessMetrics, DatabaseConnections, SecurityMetrics, WebsocketMetrics};
use pulsemeter_core::{BusinessEventKind, Metrics, SecurityEventKind, WebSocketEventKind};

use super::exclusion::is_technical_endpoint;
use super::subscribers::{MetricsEvent, Subscribers};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineSection;
use crate::refresh::providers::{BusinessGauges, DatabaseGauges, ProcessSample};
use crate::stats::{slope, RateUnit, RateWindowTracker, ResponseTimeSampler, Series, TimeSeriesBuffer, TimeSeriesSample};

/// Divisor for the cumulative security/business/websocket rates.
const CUMULATIVE_RATE_UNIT: f64 = 60.0;

struct AggregateState {
    metrics: Metrics,
    requests_window: RateWindowTracker,
    errors_window: RateWindowTracker,
    sampler: ResponseTimeSampler,
    series: TimeSeriesBuffer,
    /// (timestamp_ms, cumulative queries) from the previous database merge.
    last_query_total: Option<(u64, u64)>,
    /// (memory, cpu) from the last `trend_points` refresh ticks only.
    process_history: VecDeque<(f64, f64)>,
}

impl AggregateState {
    fn new(cfg: &EngineSection) -> Self {
        Self {
            metrics: Metrics::default(),
            requests_window: RateWindowTracker::new(cfg.rate_window_ms),
            errors_window: RateWindowTracker::new(cfg.rate_window_ms),
            sampler: ResponseTimeSampler::new(cfg.sample_capacity),
            series: TimeSeriesBuffer::new(cfg.time_series_capacity),
            last_query_total: None,
            process_history: VecDeque::with_capacity(cfg.trend_points),
        }
    }

    fn push_process_point(&mut self, trend_points: usize) {
        let perf = &self.metrics.performance;
        self.process_history.push_back((perf.memory_usage as f64, perf.cpu_usage));
        while self.process_history.len() > trend_points {
            self.process_history.pop_front();
        }
    }

    fn refresh_window_rates(&mut self, now_ms: u64) {
        self.metrics.requests.request_rate = self.requests_window.current_rate(now_ms, RateUnit::PerSecond);
        self.metrics.errors.error_rate = self.errors_window.current_rate(now_ms, RateUnit::PerSecond);
    }

    fn append_point(&mut self, now_ms: u64, response_time: f64, trend_points: usize) {
        let perf = &self.metrics.performance;
        self.series.append(TimeSeriesSample {
            timestamp_ms: now_ms,
            request_rate: self.metrics.requests.request_rate,
            response_time,
            error_rate: self.metrics.errors.error_rate,
            memory_usage: perf.memory_usage as f64,
            cpu_usage: perf.cpu_usage,
        });
        self.metrics.errors.error_trend = slope(&self.series.recent(Series::ErrorRate, trend_points));
    }
}

pub struct MetricsAggregator {
    state: Mutex<AggregateState>,
    settings: EngineSection,
    clock: Arc<dyn Clock>,
    subscribers: Subscribers,
}

impl MetricsAggregator {
    pub fn new(settings: EngineSection, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(AggregateState::new(&settings)),
            settings,
            clock,
            subscribers: Subscribers::new(),
        }
    }

    /// Default engine settings on the system clock.
    pub fn with_defaults() -> Self {
        Self::new(EngineSection::default(), Arc::new(SystemClock))
    }

    pub fn settings(&self) -> &EngineSection {
        &self.settings
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn lock(&self) -> MutexGuard<'_, AggregateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --------------------
    // Inbound events
    // --------------------

    pub fn record_request(&self, successful: bool, response_time_ms: f64, endpoint: &str, method: &str) {
        if is_technical_endpoint(endpoint) {
            return;
        }
        let x = sanitize_ms(response_time_ms);
        let now = self.clock.now_ms();
        {
            let mut guard = self.lock();
            let st = &mut *guard;
            self.apply_request(st, now, successful, x, endpoint, method);
        }

        self.subscribers.publish_with(|| MetricsEvent::RequestRecorded {
            endpoint: endpoint.to_string(),
            successful,
            response_time_ms: x,
        });
    }

    fn apply_request(&self, st: &mut AggregateState, now: u64, successful: bool, x: f64, endpoint: &str, method: &str) {
        let r = &mut st.metrics.requests;
        r.total += 1;
        if successful {
            r.successful += 1;
        } else {
            r.failed += 1;
        }
        bump(&mut r.by_endpoint, endpoint);
        bump(&mut r.by_method, method);

        let n = r.total as f64;
        r.average_response_time = (r.average_response_time * (n - 1.0) + x) / n;
        r.error_rate = r.failed as f64 / n;

        st.sampler.add(x);
        st.metrics.requests.response_time_histogram = st.sampler.histogram();

        st.requests_window.add(now);
        st.refresh_window_rates(now);
        st.append_point(now, x, self.settings.trend_points);
    }

    pub fn record_error(&self, error_type: &str, err: &dyn Display, endpoint: &str) {
        if is_technical_endpoint(endpoint) {
            return;
        }
        let now = self.clock.now_ms();
        {
            let mut guard = self.lock();
            let st = &mut *guard;
            let e = &mut st.metrics.errors;
            e.total += 1;
            bump(&mut e.by_type, error_type);
            bump(&mut e.by_endpoint, endpoint);

            st.errors_window.add(now);
            st.refresh_window_rates(now);
        }

        tracing::error!(error_type, endpoint, error = %err, "error recorded");
        self.subscribers.publish(MetricsEvent::ErrorRecorded {
            error_type: error_type.to_string(),
            endpoint: endpoint.to_string(),
        });
    }

    pub fn record_security_event(&self, kind: SecurityEventKind) {
        {
            let mut st = self.lock();
            let s = &mut st.metrics.security;
            match kind {
                SecurityEventKind::FailedLogin => s.failed_logins += 1,
                SecurityEventKind::SuspiciousRequest => s.suspicious_requests += 1,
                SecurityEventKind::BlockedRequest => s.blocked_requests += 1,
                SecurityEventKind::RateLimitHit => s.rate_limit_hits += 1,
            }
            security_rates(s);
        }

        tracing::warn!(event = %kind, "security event");
        self.subscribers.publish(MetricsEvent::Security(kind));
    }

    pub fn record_websocket_event(&self, kind: WebSocketEventKind) {
        let mut st = self.lock();
        let w = &mut st.metrics.websocket;
        match kind {
            WebSocketEventKind::Connection => {
                w.active_connections += 1;
                w.total_connections += 1;
            }
            WebSocketEventKind::Disconnection => {
                w.active_connections = w.active_connections.saturating_sub(1);
            }
            WebSocketEventKind::MessageSent => w.messages_sent += 1,
            WebSocketEventKind::MessageReceived => w.messages_received += 1,
            WebSocketEventKind::Error => w.connection_errors += 1,
        }
        websocket_rates(w);
    }

    pub fn record_business_event(&self, kind: BusinessEventKind) {
        let mut st = self.lock();
        let b = &mut st.metrics.business;
        match kind {
            BusinessEventKind::OfferCreated => b.active_offers += 1,
            BusinessEventKind::OfferCompleted => {
                b.active_offers = b.active_offers.saturating_sub(1);
                b.completed_offers += 1;
            }
            BusinessEventKind::TaskCreated => b.pending_tasks += 1,
            BusinessEventKind::TaskCompleted => {
                b.pending_tasks = b.pending_tasks.saturating_sub(1);
                b.completed_tasks += 1;
            }
            BusinessEventKind::FileUploaded => b.file_uploads += 1,
        }
        business_rates(b);
    }

    // --------------------
    // Reads
    // --------------------

    /// Deep copy of the aggregate. The lock is released before the caller
    /// serializes anything.
    pub fn snapshot(&self) -> Metrics {
        let now = self.clock.now_ms();
        let mut st = self.lock();
        st.refresh_window_rates(now);
        let mut m = st.metrics.clone();
        m.time_series = st.series.to_series();
        m
    }

    /// Zero everything. Intended for test isolation.
    pub fn reset(&self) {
        let mut st = self.lock();
        *st = AggregateState::new(&self.settings);
    }

    pub fn subscribe(&self) -> mpsc::Receiver<MetricsEvent> {
        self.subscribers.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    pub(crate) fn publish(&self, event: MetricsEvent) {
        self.subscribers.publish(event);
    }

    // --------------------
    // Scheduler merge path
    // --------------------

    /// Overwrite database gauges; `query_rate` is derived from the growth of
    /// the cumulative query counter since the previous merge.
    pub fn merge_database(&self, g: DatabaseGauges) {
        let now = self.clock.now_ms();
        let mut guard = self.lock();
        let st = &mut *guard;
        let p = &mut st.metrics.performance;

        p.active_connections = g.active_connections;
        p.database_connections = DatabaseConnections {
            active: g.active_connections,
            busy: g.busy_connections,
            total: g.total_connections,
            idle: g.idle_connections,
        };
        p.active_queries = g.active_queries;
        p.slow_queries = g.slow_queries;
        p.query_time = sanitize_ms(g.average_query_time_ms);

        if let Some((prev_ts, prev_total)) = st.last_query_total {
            let elapsed_s = now.saturating_sub(prev_ts) as f64 / 1_000.0;
            if g.total_queries < prev_total {
                // counter reset on the database side
                p.query_rate = 0.0;
            } else if elapsed_s > 0.0 {
                p.query_rate = (g.total_queries - prev_total) as f64 / elapsed_s;
            }
        }
        st.last_query_total = Some((now, g.total_queries));
    }

    /// Overwrite business counts and recompute the local business rates.
    pub fn merge_business(&self, g: BusinessGauges) {
        let mut st = self.lock();
        let b = &mut st.metrics.business;
        b.active_offers = g.active_offers;
        b.completed_offers = g.completed_offers;
        b.active_invoices = g.active_invoices;
        b.pending_tasks = g.pending_tasks;
        b.completed_tasks = g.completed_tasks;
        b.active_users = g.active_users;
        b.file_uploads = g.file_uploads;
        business_rates(b);
    }

    pub fn update_process(&self, s: ProcessSample) {
        let mut st = self.lock();
        st.metrics.performance.memory_usage = s.memory_bytes;
        st.metrics.performance.cpu_usage = if s.cpu_seconds.is_finite() { s.cpu_seconds.max(0.0) } else { 0.0 };
    }

    /// Append a periodic time-series point (response time = running average)
    /// and recompute the memory, CPU and error trends. Memory and CPU trends
    /// only see refresh-tick samples, never the per-request rows.
    pub fn sample_time_series(&self) {
        let now = self.clock.now_ms();
        let n = self.settings.trend_points;
        let mut guard = self.lock();
        let st = &mut *guard;

        st.refresh_window_rates(now);
        let avg = st.metrics.requests.average_response_time;
        st.append_point(now, avg, n);

        st.push_process_point(n);
        let (memory, cpu): (Vec<f64>, Vec<f64>) = st.process_history.iter().copied().unzip();
        st.metrics.performance.memory_trend = slope(&memory);
        st.metrics.performance.cpu_trend = slope(&cpu);
    }

    /// Age-based time-series eviction. Returns the number of rows removed.
    pub fn evict_older_than(&self, cutoff_ms: u64) -> usize {
        self.lock().series.evict_older_than(cutoff_ms)
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    if let Some(v) = map.get_mut(key) {
        *v += 1;
    } else {
        map.insert(key.to_owned(), 1);
    }
}

fn sanitize_ms(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 {
        ms
    } else {
        0.0
    }
}

fn security_rates(s: &mut SecurityMetrics) {
    s.failed_login_rate = s.failed_logins as f64 / CUMULATIVE_RATE_UNIT;
    s.security_event_rate = s.total_events() as f64 / CUMULATIVE_RATE_UNIT;
}

fn websocket_rates(w: &mut WebsocketMetrics) {
    w.message_rate = (w.messages_sent + w.messages_received) as f64 / CUMULATIVE_RATE_UNIT;
    w.connection_rate = w.total_connections as f64 / CUMULATIVE_RATE_UNIT;
}

fn business_rates(b: &mut BusinessMetrics) {
    b.offer_creation_rate = (b.active_offers + b.completed_offers) as f64 / CUMULATIVE_RATE_UNIT;
    b.offer_completion_rate = b.completed_offers as f64 / CUMULATIVE_RATE_UNIT;
    b.task_completion_rate = b.completed_tasks as f64 / CUMULATIVE_RATE_UNIT;
    b.user_activity_rate = b.active_users as f64 / CUMULATIVE_RATE_UNIT;
    b.file_upload_rate = b.file_uploads as f64 / CUMULATIVE_RATE_UNIT;
}

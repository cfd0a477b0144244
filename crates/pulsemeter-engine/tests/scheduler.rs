#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pulsemeter_core::error::{MeterError, Result};
use pulsemeter_engine::aggregate::{MetricsAggregator, MetricsEvent};
use pulsemeter_engine::config::SchedulerSection;
use pulsemeter_engine::refresh::{
    BusinessGauges, BusinessMetricsProvider, DatabaseGauges, DatabaseMetricsProvider, ProcessProbe, ProcessSample,
    RefreshScheduler,
};

fn fast() -> SchedulerSection {
    SchedulerSection {
        refresh_interval_ms: 50,
        eviction_interval_ms: 50,
        audit_interval_ms: 10_000,
        collaborator_timeout_ms: 20,
    }
}

struct FixedDatabase {
    calls: AtomicU64,
}

#[async_trait]
impl DatabaseMetricsProvider for FixedDatabase {
    async fn connection_metrics(&self) -> Result<DatabaseGauges> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(DatabaseGauges {
            active_connections: 4,
            busy_connections: 1,
            total_connections: 10,
            idle_connections: 6,
            active_queries: 2,
            slow_queries: 0,
            average_query_time_ms: 12.5,
            total_queries: n * 100,
        })
    }
}

struct FixedBusiness;

#[async_trait]
impl BusinessMetricsProvider for FixedBusiness {
    async fn business_metrics(&self) -> Result<BusinessGauges> {
        Ok(BusinessGauges {
            active_offers: 3,
            completed_offers: 9,
            active_invoices: 2,
            pending_tasks: 5,
            completed_tasks: 7,
            active_users: 12,
            file_uploads: 30,
        })
    }
}

struct FailingDatabase;

#[async_trait]
impl DatabaseMetricsProvider for FailingDatabase {
    fn name(&self) -> &'static str {
        "primary-db"
    }

    async fn connection_metrics(&self) -> Result<DatabaseGauges> {
        Err(MeterError::Collaborator {
            name: "primary-db",
            reason: "connection refused".into(),
        })
    }
}

struct HangingBusiness;

#[async_trait]
impl BusinessMetricsProvider for HangingBusiness {
    async fn business_metrics(&self) -> Result<BusinessGauges> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(BusinessGauges::default())
    }
}

struct FakeProbe;

impl ProcessProbe for FakeProbe {
    fn sample(&mut self) -> Result<ProcessSample> {
        Ok(ProcessSample {
            memory_bytes: 64 * 1024 * 1024,
            cpu_seconds: 0.25,
        })
    }
}

#[tokio::test]
async fn refresh_merges_collaborators_and_keeps_local_rates() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    for _ in 0..6 {
        agg.record_request(true, 10.0, "/api/orders", "GET");
    }
    let before = agg.snapshot();

    let handle = RefreshScheduler::new(Arc::clone(&agg), fast())
        .with_database(Arc::new(FixedDatabase { calls: AtomicU64::new(0) }))
        .with_business(Arc::new(FixedBusiness))
        .with_probe(Box::new(FakeProbe))
        .start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.stop().await;

    let m = agg.snapshot();
    let p = &m.performance;
    assert_eq!(p.database_connections.total, 10);
    assert_eq!(p.database_connections.idle, 6);
    assert_eq!(p.active_connections, 4);
    assert!((p.query_time - 12.5).abs() < 1e-9);
    assert!(p.query_rate > 0.0);
    assert_eq!(p.memory_usage, 64 * 1024 * 1024);
    assert!((p.cpu_usage - 0.25).abs() < 1e-9);

    assert_eq!(m.business.completed_tasks, 7);
    assert_eq!(m.business.active_users, 12);
    assert!((m.business.task_completion_rate - 7.0 / 60.0).abs() < 1e-9);

    // request counters and window rates are owned locally
    assert_eq!(m.requests.total, before.requests.total);
    assert!((m.requests.request_rate - before.requests.request_rate).abs() < 1e-9);

    // one point per request plus at least one per refresh
    assert!(m.time_series.len() > 6);
}

#[tokio::test]
async fn failing_collaborators_leave_previous_gauges() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    agg.merge_database(DatabaseGauges {
        active_connections: 2,
        total_connections: 8,
        ..DatabaseGauges::default()
    });
    agg.merge_business(BusinessGauges {
        active_offers: 4,
        ..BusinessGauges::default()
    });

    let handle = RefreshScheduler::new(Arc::clone(&agg), fast())
        .with_database(Arc::new(FailingDatabase))
        .with_business(Arc::new(HangingBusiness))
        .start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handle.is_running());
    handle.stop().await;

    let m = agg.snapshot();
    assert_eq!(m.performance.database_connections.total, 8);
    assert_eq!(m.performance.active_connections, 2);
    assert_eq!(m.business.active_offers, 4);
    // refresh points are still appended when collaborators fail
    assert!(!m.time_series.is_empty());
}

#[tokio::test]
async fn missing_collaborators_are_skipped() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    let handle = RefreshScheduler::new(Arc::clone(&agg), fast()).start();
    tokio::time::sleep(Duration::from_millis(120)).await;
    handle.stop().await;

    let m = agg.snapshot();
    assert_eq!(m.performance.database_connections.total, 0);
    assert_eq!(m.performance.memory_usage, 0);
    assert!(!m.time_series.is_empty());
}

#[tokio::test]
async fn refresh_notifies_subscribers() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    let mut rx = agg.subscribe();
    let handle = RefreshScheduler::new(Arc::clone(&agg), fast())
        .with_business(Arc::new(FixedBusiness))
        .start();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("refresh event within 2s")
        .expect("channel open");
    handle.stop().await;

    match event {
        MetricsEvent::Refreshed(m) => assert_eq!(m.business.completed_offers, 9),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn stop_ends_all_loops() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    let handle = RefreshScheduler::new(Arc::clone(&agg), fast()).start();
    assert!(handle.is_running());
    tokio::time::timeout(Duration::from_secs(2), handle.stop())
        .await
        .expect("stop completes");

    let points = agg.snapshot().time_series.len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(agg.snapshot().time_series.len(), points);
}

#[tokio::test]
async fn zero_periods_do_not_panic() {
    let agg = Arc::new(MetricsAggregator::with_defaults());
    let zero = SchedulerSection {
        refresh_interval_ms: 0,
        eviction_interval_ms: 0,
        audit_interval_ms: 0,
        collaborator_timeout_ms: 0,
    };
    let handle = RefreshScheduler::new(Arc::clone(&agg), zero)
        .with_business(Arc::new(FixedBusiness))
        .start();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(handle.is_running());
    tokio::time::timeout(Duration::from_secs(2), handle.stop())
        .await
        .expect("stop completes");

    assert!(!agg.snapshot().time_series.is_empty());
}

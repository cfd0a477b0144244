#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use pulsemeter_core::{BusinessEventKind, Metrics, SecurityEventKind, WebSocketEventKind};
use pulsemeter_engine::aggregate::{MetricsAggregator, MetricsEvent};
use pulsemeter_engine::clock::{Clock, ManualClock};
use pulsemeter_engine::config::EngineSection;

const T0: u64 = 1_700_000_000_000;

fn manual() -> (Arc<ManualClock>, MetricsAggregator) {
    let clock = Arc::new(ManualClock::new(T0));
    let agg = MetricsAggregator::new(EngineSection::default(), clock.clone());
    (clock, agg)
}

#[test]
fn concurrent_records_are_not_lost() {
    let agg = Arc::new(MetricsAggregator::with_defaults());

    let workers: Vec<_> = (0..10)
        .map(|w| {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for i in 0..100 {
                    let endpoint = format!("/api/worker/{w}");
                    agg.record_request(i % 10 != 0, 5.0, &endpoint, "GET");
                }
            })
        })
        .collect();
    for h in workers {
        h.join().unwrap();
    }

    let m = agg.snapshot();
    assert_eq!(m.requests.total, 1_000);
    assert_eq!(m.requests.successful + m.requests.failed, 1_000);
    assert_eq!(m.requests.failed, 100);
    assert_eq!(m.requests.by_method.get("GET"), Some(&1_000));
    assert_eq!(m.requests.by_endpoint.values().sum::<u64>(), 1_000);
}

#[test]
fn reset_then_snapshot_is_zero_value() {
    let (clock, agg) = manual();
    agg.record_request(true, 120.0, "/api/orders", "POST");
    agg.record_error("ValidationError", &"bad input", "/api/orders");
    agg.record_security_event(SecurityEventKind::BlockedRequest);
    agg.record_websocket_event(WebSocketEventKind::Connection);
    agg.record_business_event(BusinessEventKind::FileUploaded);
    agg.sample_time_series();
    clock.advance_ms(1_000);

    agg.reset();
    assert_eq!(agg.snapshot(), Metrics::default());
}

#[test]
fn end_to_end_scenario() {
    let (clock, agg) = manual();

    for ms in [100.0, 200.0, 300.0] {
        agg.record_request(true, ms, "/api/clients", "GET");
        clock.advance_ms(10);
    }
    let m = agg.snapshot();
    assert_eq!(m.requests.total, 3);
    assert_eq!(m.requests.successful, 3);
    assert!((m.requests.average_response_time - 200.0).abs() < 1e-9);

    agg.record_error("NotFoundException", &"client 999 not found", "/api/client/999");
    let m = agg.snapshot();
    assert_eq!(m.errors.total, 1);
    assert_eq!(m.errors.by_type.get("NotFoundException"), Some(&1));
    assert_eq!(m.errors.by_endpoint.get("/api/client/999"), Some(&1));

    agg.record_business_event(BusinessEventKind::TaskCreated);
    agg.record_business_event(BusinessEventKind::TaskCompleted);
    let m = agg.snapshot();
    assert_eq!(m.business.pending_tasks, 0);
    assert_eq!(m.business.completed_tasks, 1);
}

#[test]
fn technical_endpoints_are_not_measured() {
    let (_clock, agg) = manual();
    for path in ["/api/health", "/health/ready", "/metrics/prometheus", "/api/version?x=1", "/test"] {
        agg.record_request(true, 3.0, path, "GET");
    }
    assert_eq!(agg.snapshot().requests.total, 0);

    agg.record_request(true, 3.0, "/api/healthcheck-report", "GET");
    assert_eq!(agg.snapshot().requests.total, 1);
}

#[test]
fn disconnection_without_connection_stays_at_zero() {
    let (_clock, agg) = manual();
    agg.record_websocket_event(WebSocketEventKind::Disconnection);
    agg.record_websocket_event(WebSocketEventKind::Disconnection);
    assert_eq!(agg.snapshot().websocket.active_connections, 0);

    agg.record_websocket_event(WebSocketEventKind::Connection);
    agg.record_websocket_event(WebSocketEventKind::Disconnection);
    agg.record_websocket_event(WebSocketEventKind::Disconnection);
    let w = agg.snapshot().websocket;
    assert_eq!(w.active_connections, 0);
    assert_eq!(w.total_connections, 1);
}

#[test]
fn time_series_survives_a_simulated_day() {
    let clock = Arc::new(ManualClock::new(T0));
    let settings = EngineSection {
        time_series_capacity: 100,
        ..EngineSection::default()
    };
    let agg = MetricsAggregator::new(settings, clock.clone());

    // one refresh point every 30 minutes for 24h
    for _ in 0..48 {
        agg.sample_time_series();
        clock.advance_ms(30 * 60 * 1_000);
    }
    agg.sample_time_series();
    clock.advance_ms(1_000);

    let cutoff = clock.now_ms() - 24 * 60 * 60 * 1_000;
    let removed = agg.evict_older_than(cutoff);
    assert_eq!(removed, 1);

    let ts = agg.snapshot().time_series;
    assert!(ts.timestamps.iter().all(|t| *t >= cutoff));
    let n = ts.timestamps.len();
    assert_eq!(n, 48);
    for len in [
        ts.request_rates.len(),
        ts.response_times.len(),
        ts.error_rates.len(),
        ts.memory_usage.len(),
        ts.cpu_usage.len(),
    ] {
        assert_eq!(len, n);
    }
}

#[test]
fn subscribers_see_errors_and_security_events() {
    let (_clock, agg) = manual();
    let mut rx = agg.subscribe();

    agg.record_error("TimeoutError", &"upstream timed out", "/api/orders");
    agg.record_security_event(SecurityEventKind::FailedLogin);

    match rx.try_recv().unwrap() {
        MetricsEvent::ErrorRecorded { error_type, endpoint } => {
            assert_eq!(error_type, "TimeoutError");
            assert_eq!(endpoint, "/api/orders");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.try_recv().unwrap() {
        MetricsEvent::Security(kind) => assert_eq!(kind, SecurityEventKind::FailedLogin),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

//! Prometheus text exposition of a `Metrics` snapshot.
//!
//! Every family gets one `# HELP` and one `# TYPE` line followed by its
//! samples. Labels are kept in the order given, and map-backed families
//! iterate in key order (the model uses `BTreeMap`), so output is deterministic.

use std::fmt::{Display, Write};

use pulsemeter_core::Metrics;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy)]
enum Kind {
    Counter,
    Gauge,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Counter => "counter",
            Kind::Gauge => "gauge",
        }
    }
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
struct Exposition {
    out: String,
}

impl Exposition {
    fn family(&mut self, name: &str, kind: Kind, help: &str) -> &mut Self {
        let _ = writeln!(self.out, "# HELP {name} {help}");
        let _ = writeln!(self.out, "# TYPE {name} {}", kind.as_str());
        self
    }

    fn sample(&mut self, name: &str, labels: &[(&str, &str)], v: impl Display) -> &mut Self {
        if labels.is_empty() {
            let _ = writeln!(self.out, "{name} {v}");
        } else {
            let label_str = labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(self.out, "{name}{{{label_str}}} {v}");
        }
        self
    }

    fn single(&mut self, name: &str, kind: Kind, help: &str, v: impl Display) -> &mut Self {
        self.family(name, kind, help).sample(name, &[], v)
    }
}

/// Render the snapshot. Call this after `snapshot()` returned, never under the
/// aggregator lock.
pub fn render(m: &Metrics) -> String {
    use Kind::{Counter, Gauge};

    let mut x = Exposition::default();

    // requests
    let r = &m.requests;
    x.family("http_requests_total", Counter, "Total number of HTTP requests")
        .sample("http_requests_total", &[("status", "success")], r.successful)
        .sample("http_requests_total", &[("status", "error")], r.failed);
    x.family("http_requests_by_endpoint_total", Counter, "HTTP requests per endpoint");
    for (endpoint, n) in &r.by_endpoint {
        x.sample("http_requests_by_endpoint_total", &[("endpoint", endpoint)], n);
    }
    x.family("http_requests_by_method_total", Counter, "HTTP requests per method");
    for (method, n) in &r.by_method {
        x.sample("http_requests_by_method_total", &[("method", method)], n);
    }
    x.single(
        "http_request_duration_seconds",
        Gauge,
        "Average HTTP request duration",
        r.average_response_time / 1_000.0,
    );
    let h = r.response_time_histogram;
    x.family(
        "http_request_duration_quantile_seconds",
        Gauge,
        "HTTP request duration percentiles over recent samples",
    )
    .sample("http_request_duration_quantile_seconds", &[("quantile", "0.5")], h.p50 / 1_000.0)
    .sample("http_request_duration_quantile_seconds", &[("quantile", "0.9")], h.p90 / 1_000.0)
    .sample("http_request_duration_quantile_seconds", &[("quantile", "0.95")], h.p95 / 1_000.0)
    .sample("http_request_duration_quantile_seconds", &[("quantile", "0.99")], h.p99 / 1_000.0);
    x.single("http_request_rate", Gauge, "HTTP requests per second over the sliding window", r.request_rate);
    x.single("http_request_error_ratio", Gauge, "Failed HTTP requests over total", r.error_rate);

    // errors
    let e = &m.errors;
    x.single("http_errors_total", Counter, "Total number of HTTP errors", e.total);
    x.family("http_errors_by_type_total", Counter, "HTTP errors per error type");
    for (ty, n) in &e.by_type {
        x.sample("http_errors_by_type_total", &[("type", ty)], n);
    }
    x.family("http_errors_by_endpoint_total", Counter, "HTTP errors per endpoint");
    for (endpoint, n) in &e.by_endpoint {
        x.sample("http_errors_by_endpoint_total", &[("endpoint", endpoint)], n);
    }
    x.single("http_error_rate", Gauge, "HTTP errors per second over the sliding window", e.error_rate);
    x.single("http_error_trend", Gauge, "Slope of the recent error rate", e.error_trend);

    // performance
    let p = &m.performance;
    x.single("process_memory_usage_bytes", Gauge, "Memory usage in bytes", p.memory_usage);
    x.single("process_cpu_seconds", Gauge, "CPU seconds used since the previous refresh", p.cpu_usage);
    x.single("process_memory_trend", Gauge, "Slope of recent memory usage", p.memory_trend);
    x.single("process_cpu_trend", Gauge, "Slope of recent CPU usage", p.cpu_trend);
    let c = p.database_connections;
    x.family("db_connections", Gauge, "Database connections by state")
        .sample("db_connections", &[("state", "active")], c.active)
        .sample("db_connections", &[("state", "busy")], c.busy)
        .sample("db_connections", &[("state", "total")], c.total)
        .sample("db_connections", &[("state", "idle")], c.idle);
    x.single("db_active_queries", Gauge, "Queries currently running", p.active_queries);
    x.single("db_slow_queries", Gauge, "Queries running longer than one second", p.slow_queries);
    x.single("db_query_time_seconds", Gauge, "Average query time", p.query_time / 1_000.0);
    x.single("db_query_rate", Gauge, "Queries per second between refreshes", p.query_rate);

    // security
    let s = &m.security;
    x.single("security_failed_logins_total", Counter, "Total number of failed login attempts", s.failed_logins);
    x.single(
        "security_suspicious_requests_total",
        Counter,
        "Total number of suspicious requests",
        s.suspicious_requests,
    );
    x.single("security_blocked_requests_total", Counter, "Total number of blocked requests", s.blocked_requests);
    x.single("security_rate_limit_hits_total", Counter, "Total number of rate limit hits", s.rate_limit_hits);
    x.single("security_failed_login_rate", Gauge, "Failed logins per minute", s.failed_login_rate);
    x.single("security_event_rate", Gauge, "Security events per minute", s.security_event_rate);

    // business
    let b = &m.business;
    x.single("business_offers_completed_total", Counter, "Completed offers", b.completed_offers);
    x.single("business_tasks_completed_total", Counter, "Completed tasks", b.completed_tasks);
    x.single("business_file_uploads_total", Counter, "Uploaded files", b.file_uploads);
    x.single("business_active_offers", Gauge, "Offers not yet completed", b.active_offers);
    x.single("business_active_invoices", Gauge, "Open invoices", b.active_invoices);
    x.single("business_pending_tasks", Gauge, "Tasks not yet completed", b.pending_tasks);
    x.single("business_active_users", Gauge, "Active users", b.active_users);
    x.family("business_rate", Gauge, "Business activity per minute")
        .sample("business_rate", &[("kind", "offer_creation")], b.offer_creation_rate)
        .sample("business_rate", &[("kind", "offer_completion")], b.offer_completion_rate)
        .sample("business_rate", &[("kind", "task_completion")], b.task_completion_rate)
        .sample("business_rate", &[("kind", "user_activity")], b.user_activity_rate)
        .sample("business_rate", &[("kind", "file_upload")], b.file_upload_rate);

    // websocket
    let w = &m.websocket;
    x.single("websocket_connections_active", Gauge, "Open WebSocket connections", w.active_connections);
    x.single("websocket_connections_total", Counter, "Accepted WebSocket connections", w.total_connections);
    x.family("websocket_messages_total", Counter, "WebSocket messages by direction")
        .sample("websocket_messages_total", &[("direction", "sent")], w.messages_sent)
        .sample("websocket_messages_total", &[("direction", "received")], w.messages_received);
    x.single("websocket_connection_errors_total", Counter, "WebSocket connection errors", w.connection_errors);
    x.single("websocket_message_rate", Gauge, "WebSocket messages per minute", w.message_rate);
    x.single("websocket_connection_rate", Gauge, "WebSocket connections per minute", w.connection_rate);

    x.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_family_has_help_then_type() {
        let text = render(&Metrics::default());
        let lines: Vec<&str> = text.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if let Some(rest) = line.strip_prefix("# HELP ") {
                let name = rest.split(' ').next().unwrap_or_default();
                let next = lines.get(i + 1).copied().unwrap_or_default();
                assert!(next.starts_with(&format!("# TYPE {name} ")), "{name} lacks TYPE");
            }
        }
        let helps = lines.iter().filter(|l| l.starts_with("# HELP")).count();
        let types = lines.iter().filter(|l| l.starts_with("# TYPE")).count();
        assert_eq!(helps, types);
    }

    #[test]
    fn counters_and_gauges_are_typed() {
        let text = render(&Metrics::default());
        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains("# TYPE websocket_messages_total counter"));
        assert!(text.contains("# TYPE business_tasks_completed_total counter"));
        assert!(text.contains("# TYPE process_memory_usage_bytes gauge"));
        assert!(text.contains("# TYPE websocket_connections_active gauge"));
        assert!(text.contains("# TYPE http_error_trend gauge"));
    }

    #[test]
    fn labels_are_escaped() {
        let mut m = Metrics::default();
        m.errors.by_type.insert("Bad\"Quote".into(), 3);
        m.requests.successful = 2;
        let text = render(&m);
        assert!(text.contains(r#"http_errors_by_type_total{type="Bad\"Quote"} 3"#));
        assert!(text.contains(r#"http_requests_total{status="success"} 2"#));
    }
}

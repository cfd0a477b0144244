//! Technical endpoints that never count as application traffic.
//!
//! The set is fixed: health probes, the metrics endpoints themselves, version
//! info, test fixtures and validation-test routes. Matching is on the first
//! path segment after an optional `/api` prefix, ignoring the query string and
//! trailing slashes.

const TECHNICAL_ROOTS: [&str; 5] = ["health", "metrics", "version", "test", "validation-test"];

pub fn is_technical_endpoint(endpoint: &str) -> bool {
    let path = endpoint.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    let first = match segments.next() {
        Some("api") => segments.next(),
        other => other,
    };

    match first {
        Some(seg) => TECHNICAL_ROOTS
            .iter()
            .any(|root| seg.eq_ignore_ascii_case(root)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_technical_endpoint;

    #[test]
    fn matches_fixed_routes() {
        for p in [
            "/health",
            "/api/health",
            "/api/health/ready",
            "/health/live",
            "/metrics",
            "/api/metrics/prometheus",
            "/version",
            "/api/version/info",
            "/test/setup",
            "/api/test/cleanup",
            "/validation-test/client",
            "/api/health?verbose=1",
            "/api/metrics/",
        ] {
            assert!(is_technical_endpoint(p), "{p} should be excluded");
        }
    }

    #[test]
    fn keeps_application_routes() {
        for p in [
            "/",
            "",
            "/api",
            "/api/client/999",
            "/api/offer",
            "/api/healthcare",
            "/api/testimonials",
            "/api/client/health",
        ] {
            assert!(!is_technical_endpoint(p), "{p} should be recorded");
        }
    }
}

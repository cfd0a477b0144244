#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceExt;

use pulsemeter_engine::{app_state::AppState, config::MeterConfig, ops, router};

fn state() -> AppState {
    AppState::new(MeterConfig::default()).expect("default config is valid")
}

async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, String) {
    let res = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let ct = res
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, ct, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn health_routes_respond() {
    let st = state();
    let app = router::build_router(st.clone());

    let (status, _, body) = get_path(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "healthy");

    let (status, _, body) = get_path(app.clone(), "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("alive"));

    let (status, _, _) = get_path(app.clone(), "/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    st.begin_draining();
    let (status, _, body) = get_path(app, "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("not ready"));
}

#[tokio::test]
async fn json_export_wraps_snapshot() {
    let st = state();
    st.aggregator().record_request(true, 40.0, "/api/orders", "GET");
    let app = router::build_router(st);

    let (status, ct, body) = get_path(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct.as_deref(), Some("application/json"));

    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(v["timestamp"].as_u64().unwrap() > 0);
    assert_eq!(v["metrics"]["requests"]["total"], 1);
    assert_eq!(v["metrics"]["requests"]["byEndpoint"]["/api/orders"], 1);
    assert!(v["metrics"]["timeSeries"]["timestamps"].is_array());
}

#[tokio::test]
async fn prometheus_export_has_text_content_type() {
    let st = state();
    st.aggregator().record_request(false, 12.0, "/api/orders", "DELETE");
    let app = router::build_router(st);

    let (status, ct, body) = get_path(app, "/metrics/prometheus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct.as_deref(), Some("text/plain; version=0.0.4; charset=utf-8"));
    assert!(body.contains("# TYPE http_requests_total counter"));
    assert!(body.contains(r#"http_requests_total{status="error"} 1"#));
    assert!(body.contains(r#"http_requests_by_method_total{method="DELETE"} 1"#));
}

#[tokio::test]
async fn technical_routes_are_not_recorded() {
    let st = state();
    let app = router::build_router(st.clone());

    for path in ["/health", "/health/live", "/metrics", "/metrics/prometheus"] {
        let _ = get_path(app.clone(), path).await;
    }
    assert_eq!(st.aggregator().snapshot().requests.total, 0);
}

#[tokio::test]
async fn middleware_records_application_routes() {
    let st = state();
    let app = Router::new()
        .route("/api/orders", get(|| async { "ok" }))
        .route("/api/missing", get(|| async { StatusCode::NOT_FOUND }))
        .layer(middleware::from_fn_with_state(st.clone(), ops::record_requests))
        .with_state(st.clone());

    let (status, _, _) = get_path(app.clone(), "/api/orders").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = get_path(app, "/api/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let r = st.aggregator().snapshot().requests;
    assert_eq!(r.total, 2);
    assert_eq!(r.successful, 1);
    assert_eq!(r.failed, 1);
    assert_eq!(r.by_method.get("GET"), Some(&2));
    assert_eq!(r.by_endpoint.get("/api/missing"), Some(&1));
    assert!((r.error_rate - 0.5).abs() < 1e-9);
}

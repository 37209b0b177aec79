//! Prometheus exporter test.
//!
//! Kept in its own binary: the recorder is process-global.

mod common;

use axum::http::StatusCode;
use common::{
    create_test_app, get_request, json_request, response_text, sample_snapshot, test_config,
};
use powerguard_api::middleware::init_metrics;
use tower::ServiceExt;

#[tokio::test]
async fn test_metrics_exported() {
    init_metrics().unwrap();
    let (app, _store) = create_test_app(test_config());

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/v1/analyze",
            &sample_snapshot("device-metrics-1", Some("Save battery")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = response_text(response).await;
    assert!(text.contains("analysis_requests_total"));
    assert!(text.contains("response_type=\"optimization\""));
    assert!(text.contains("http_requests_total"));
}

//! Integration tests for the analysis endpoint.
//!
//! Run with: cargo test --test analyze_integration

mod common;

use axum::http::StatusCode;
use common::{
    create_test_app, get_request, json_request, parse_response_body, sample_snapshot, test_config,
};
use domain::services::UsagePatternStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn insight_types(body: &Value) -> Vec<String> {
    body["insights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["type"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_optimization_request() {
    let (app, _store) = create_test_app(test_config());
    let snapshot = sample_snapshot("device-opt-1", Some("Save battery but keep WhatsApp working"));

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["responseType"], "optimization");
    assert!(body["id"].as_str().unwrap().starts_with("gen_"));

    let actions = body["actionable"].as_array().unwrap();
    assert!(!actions.is_empty());
    let whatsapp: Vec<&Value> = actions
        .iter()
        .filter(|a| a["packageName"] == "com.whatsapp")
        .collect();
    assert_eq!(whatsapp.len(), 1);
    assert_eq!(whatsapp[0]["newMode"], "normal");

    let types = insight_types(&body);
    assert_eq!(types[0], "Strategy");
    assert!(types.contains(&"CriticalApps".to_string()));
}

#[tokio::test]
async fn test_scores_and_savings_are_present() {
    let (app, _store) = create_test_app(test_config());
    let snapshot = sample_snapshot("device-opt-2", None);

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();
    let body = parse_response_body(response).await;

    for key in ["batteryScore", "dataScore", "performanceScore"] {
        let score = body[key].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&score), "{} out of range", key);
    }
    let minutes = body["estimatedSavings"]["batteryMinutes"].as_u64().unwrap();
    let data_mb = body["estimatedSavings"]["dataMB"].as_u64().unwrap();
    assert!(minutes > 0);
    assert!(data_mb > 0);

    let strategy = body["insights"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["type"] == "Strategy")
        .unwrap();
    let description = strategy["description"].as_str().unwrap();
    assert!(description.contains(&format!("{} minutes", minutes)));
    assert!(description.contains(&format!("{} MB", data_mb)));
}

#[tokio::test]
async fn test_information_request() {
    let (app, store) = create_test_app(test_config());
    let snapshot = sample_snapshot("device-info-1", Some("Which apps are using the most battery?"));

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["responseType"], "information");
    assert!(body["actionable"].as_array().unwrap().is_empty());
    assert_eq!(body["insights"][0]["type"], "BatteryInformation");
    assert!(body["insights"][0]["description"]
        .as_str()
        .unwrap()
        .contains("Netflix"));

    // Only optimization results record usage patterns
    assert!(store.list_patterns("device-info-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_yes_no_question() {
    let (app, _store) = create_test_app(test_config());
    let snapshot = sample_snapshot("device-yn-1", Some("Can I watch YouTube for 3 hours?"));

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();
    let body = parse_response_body(response).await;

    assert_eq!(body["responseType"], "information");
    assert!(body["actionable"].as_array().unwrap().is_empty());
    let insights = body["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0]["type"], "YesNo");
}

#[tokio::test]
async fn test_optimization_stores_patterns() {
    let (app, store) = create_test_app(test_config());
    let snapshot = sample_snapshot("device-pat-1", Some("Save battery but keep WhatsApp working"));

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let patterns = store.list_patterns("device-pat-1").await.unwrap();
    assert_eq!(patterns.len(), 5);
    assert!(patterns["com.netflix.mediaclient"].contains("Very high battery usage"));
    assert!(patterns["com.whatsapp"].contains("Critical app for user"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (app, _store) = create_test_app(test_config());
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/analyze")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_out_of_range_battery_rejected() {
    let (app, _store) = create_test_app(test_config());
    let mut snapshot = sample_snapshot("device-bad-1", None);
    snapshot["battery"]["level"] = json!(150.0);

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "battery.level");
}

#[tokio::test]
async fn test_malformed_package_name_rejected() {
    let (app, _store) = create_test_app(test_config());
    let mut snapshot = sample_snapshot("device-bad-2", None);
    snapshot["apps"][0]["packageName"] = json!("com.whatsapp; rm -rf");

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "apps[0].package_name");
}

#[tokio::test]
async fn test_missing_device_id_rejected() {
    let (app, _store) = create_test_app(test_config());
    let mut snapshot = sample_snapshot("placeholder", None);
    snapshot["deviceId"] = json!("");

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_sentinels_accepted() {
    let (app, _store) = create_test_app(test_config());
    let mut snapshot = sample_snapshot("device-sentinel-1", None);
    snapshot["battery"]["level"] = json!(-1);
    snapshot["cpu"]["usage"] = json!(-1);

    let response = app
        .oneshot(json_request("/api/v1/analyze", &snapshot))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_trace_id_echoed() {
    let (app, _store) = create_test_app(test_config());
    let mut request = json_request("/api/v1/analyze", &sample_snapshot("device-trace-1", None));
    request
        .headers_mut()
        .insert("x-trace-id", "trace-abc-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-abc-123"
    );
}

#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    let (app, _store) = create_test_app(test_config());

    let response = app.oneshot(get_request("/api/v1/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "not_found");
}

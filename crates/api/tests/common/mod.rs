//! Common test utilities for integration tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` against
//! an in-memory pattern store, so no database is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use http_body_util::BodyExt;
use powerguard_api::{
    app::create_app,
    config::{
        AnalysisConfig, ClassifierConfig, Config, DatabaseConfig, LoggingConfig, SecurityConfig,
        ServerConfig,
    },
};
use serde_json::{json, Value};
use std::sync::Arc;

use domain::services::InMemoryPatternStore;

/// Test configuration: in-memory store, classifier off, fixed savings seed.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 1000,
            analyze_rate_limit_per_minute: 1000,
        },
        analysis: AnalysisConfig {
            default_data_plan_mb: 2000.0,
            savings_seed: Some(42),
            max_concurrent: 16,
            timeout_ms: 5000,
        },
        classifier: ClassifierConfig {
            enabled: false,
            base_url: String::new(),
            timeout_ms: 3000,
            rate_limit_per_minute: 30,
            circuit_breaker_failures: 5,
            circuit_breaker_reset_secs: 60,
        },
    }
}

/// Build the router over a fresh in-memory store; the store is returned for inspection.
pub fn create_test_app(config: Config) -> (Router, Arc<InMemoryPatternStore>) {
    let store = Arc::new(InMemoryPatternStore::new());
    let app = create_app(config, store.clone());
    (app, store)
}

/// Build a JSON POST request.
pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Read the response body as text.
pub async fn response_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A realistic snapshot: 45% battery on wifi with five apps of mixed usage.
pub fn sample_snapshot(device_id: &str, prompt: Option<&str>) -> Value {
    let mut snapshot = json!({
        "deviceId": device_id,
        "timestamp": 1686123456,
        "battery": {
            "level": 45.0,
            "temperature": 35.0,
            "voltage": 4000.0,
            "isCharging": false,
            "chargingType": "none",
            "health": 2,
            "capacity": -1,
            "currentNow": -1
        },
        "memory": {
            "totalRam": 8000000000u64,
            "availableRam": 4000000000u64,
            "lowMemory": false,
            "threshold": 1000000000u64
        },
        "cpu": { "usage": 35.0, "temperature": 40.0, "frequencies": [1800, 2400] },
        "network": {
            "type": "wifi",
            "strength": 3,
            "isRoaming": false,
            "dataUsage": {
                "foreground": 500.0,
                "background": 200.0,
                "rxBytes": 1000000,
                "txBytes": 500000
            },
            "activeConnectionInfo": "wifi",
            "linkSpeed": 300,
            "cellularGeneration": "none"
        },
        "apps": [
            app("com.whatsapp", "WhatsApp", 15.0, 150.0, 50.0, 3600.0),
            app("com.google.android.gm", "Gmail", 5.0, 40.0, 30.0, 1200.0),
            app("com.google.android.apps.maps", "Google Maps", 12.0, 90.0, 10.0, 2400.0),
            app("com.netflix.mediaclient", "Netflix", 25.0, 700.0, 20.0, 5400.0),
            app("com.facebook.katana", "Facebook", 8.0, 120.0, 140.0, 1500.0)
        ],
        "settings": {
            "powerSaveMode": false,
            "dataSaver": false,
            "batteryOptimization": true,
            "adaptiveBattery": true,
            "autoSync": true
        }
    });
    if let Some(prompt) = prompt {
        snapshot["prompt"] = json!(prompt);
    }
    snapshot
}

fn app(
    package: &str,
    name: &str,
    battery: f64,
    foreground_mb: f64,
    background_mb: f64,
    foreground_secs: f64,
) -> Value {
    json!({
        "packageName": package,
        "processName": package,
        "appName": name,
        "isSystemApp": false,
        "lastUsed": 1686123000,
        "foregroundTime": foreground_secs,
        "backgroundTime": foreground_secs / 2.0,
        "batteryUsage": battery,
        "dataUsage": {
            "foreground": foreground_mb,
            "background": background_mb,
            "rxBytes": -1,
            "txBytes": -1
        },
        "memoryUsage": 150.0,
        "cpuUsage": 3.5,
        "notifications": 12,
        "crashes": 0,
        "alarmWakeups": 4
    })
}

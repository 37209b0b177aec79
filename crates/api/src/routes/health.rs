//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::services::CircuitState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
    pub external_services: ExternalServicesHealth,
}

/// Pattern store health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreHealth {
    /// "postgres" or "memory"
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExternalServicesHealth {
    pub classifier: ClassifierHealth,
}

/// External classifier health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassifierHealth {
    pub enabled: bool,
    /// Whether requests currently go out (circuit not open).
    pub available: bool,
    pub circuit_state: String,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Returns 503 when the pattern store cannot be reached. The classifier is
/// advisory and never makes the service unhealthy.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let start = std::time::Instant::now();
    let connected = state.store.ping().await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let (available, circuit_state) = match &state.classifier {
        Some(client) => {
            let circuit = client.circuit_state().await;
            (
                client.is_available() && circuit != CircuitState::Open,
                circuit.as_str().to_string(),
            )
        }
        None if !state.config.classifier.enabled => (false, "disabled".to_string()),
        None => (false, "initialization_failed".to_string()),
    };

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealth {
            backend: store_backend(&state).to_string(),
            connected,
            latency_ms: connected.then_some(latency_ms),
        },
        external_services: ExternalServicesHealth {
            classifier: ClassifierHealth {
                enabled: state.config.classifier.enabled,
                available,
                circuit_state,
            },
        },
    };

    if connected {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn store_backend(state: &AppState) -> &'static str {
    if state.config.database.is_configured() {
        "postgres"
    } else {
        "memory"
    }
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK once the pattern store answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

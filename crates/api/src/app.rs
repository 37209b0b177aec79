use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{ExternalClassifier, UsagePatternStore};

use crate::config::Config;
use crate::middleware::{
    analyze_rate_limit_middleware, metrics_handler, metrics_middleware, rate_limit_middleware,
    trace_id, ClientRateLimiter,
};
use crate::routes::{self, analysis, health, patterns};
use crate::services::{AnalysisService, LlmClassifierClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: Arc<AnalysisService>,
    pub store: Arc<dyn UsagePatternStore>,
    pub classifier: Option<Arc<LlmClassifierClient>>,
    pub rate_limiter: Arc<ClientRateLimiter>,
    pub analyze_rate_limiter: Arc<ClientRateLimiter>,
}

fn build_classifier(config: &Config) -> Option<Arc<LlmClassifierClient>> {
    if !config.classifier.enabled {
        return None;
    }
    match LlmClassifierClient::new(config.classifier.clone()) {
        Ok(client) => {
            tracing::info!(base_url = %config.classifier.base_url, "External classifier enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build classifier client, using rules only");
            None
        }
    }
}

pub fn create_app(config: Config, store: Arc<dyn UsagePatternStore>) -> Router {
    let config = Arc::new(config);

    let classifier = build_classifier(&config);
    let external = classifier
        .clone()
        .map(|client| client as Arc<dyn ExternalClassifier>);
    let analysis_service = Arc::new(AnalysisService::new(&config, store.clone(), external));

    let state = AppState {
        config: config.clone(),
        analysis: analysis_service,
        store,
        classifier,
        rate_limiter: Arc::new(ClientRateLimiter::new(config.security.rate_limit_per_minute)),
        analyze_rate_limiter: Arc::new(ClientRateLimiter::new(
            config.security.analyze_rate_limit_per_minute,
        )),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Analysis is CPU-bound, so it gets its own, stricter per-client limit
    let analyze_routes = Router::new()
        .route("/api/v1/analyze", post(analysis::analyze_device))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            analyze_rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/v1/patterns", get(patterns::list_patterns))
        .route(
            "/api/v1/patterns/:device_id",
            get(patterns::get_device_patterns),
        )
        .merge(analyze_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Public routes (no rate limiting)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(routes::not_found)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

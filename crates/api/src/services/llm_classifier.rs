//! HTTP client for the external prompt classifier.
//!
//! Features:
//! - Token-bucket rate limiting
//! - Circuit breaker for resilience
//! - Request timeout

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use domain::models::{ActionableType, PromptClassification};
use domain::services::{ClassifierError, ExternalClassifier};

use crate::config::ClassifierConfig;

#[derive(Debug, Error)]
pub enum LlmClassifierError {
    #[error("Classifier is disabled")]
    Disabled,

    #[error("Classifier base URL not configured")]
    NotConfigured,

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

impl From<LlmClassifierError> for ClassifierError {
    fn from(e: LlmClassifierError) -> Self {
        match e {
            LlmClassifierError::Disabled | LlmClassifierError::NotConfigured => {
                ClassifierError::Disabled
            }
            LlmClassifierError::RateLimited => ClassifierError::RateLimited,
            LlmClassifierError::Timeout(ms) => ClassifierError::Timeout(ms),
            LlmClassifierError::InvalidResponse(msg) => ClassifierError::Malformed(msg),
            other => ClassifierError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResponse {
    is_relevant: bool,
    #[serde(default)]
    optimize_battery: bool,
    #[serde(default)]
    optimize_data: bool,
    #[serde(default)]
    actionable_focus: Vec<String>,
}

impl From<ClassifyResponse> for PromptClassification {
    fn from(r: ClassifyResponse) -> Self {
        let mut classification = PromptClassification {
            optimize_battery: r.optimize_battery,
            optimize_data: r.optimize_data,
            is_relevant: r.is_relevant,
            ..PromptClassification::irrelevant()
        };
        let focus: Vec<ActionableType> = r
            .actionable_focus
            .iter()
            .map(|raw| ActionableType::coerce(raw))
            .collect();
        classification.add_focus(&focus);
        classification
    }
}

// Rate limiter

/// Token bucket refilled once per minute.
struct RateLimiter {
    tokens: AtomicU32,
    max_tokens: u32,
    started: Instant,
    /// Last refill, in millis since `started`.
    last_refill: AtomicU64,
}

impl RateLimiter {
    fn new(requests_per_minute: u32) -> Self {
        Self {
            tokens: AtomicU32::new(requests_per_minute),
            max_tokens: requests_per_minute,
            started: Instant::now(),
            last_refill: AtomicU64::new(0),
        }
    }

    fn try_acquire(&self) -> bool {
        let now_millis = self.started.elapsed().as_millis() as u64;
        let last_refill = self.last_refill.load(Ordering::Relaxed);

        if now_millis.saturating_sub(last_refill) >= 60_000 {
            self.tokens.store(self.max_tokens, Ordering::Relaxed);
            self.last_refill.store(now_millis, Ordering::Relaxed);
        }

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .tokens
                .compare_exchange_weak(current, current - 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}

// Circuit breaker

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

struct CircuitBreaker {
    is_open: AtomicBool,
    /// Consecutive failures
    failure_count: AtomicU32,
    failure_threshold: u32,
    reset_timeout: Duration,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(failure_threshold: u32, reset_timeout_secs: u64) -> Self {
        Self {
            is_open: AtomicBool::new(false),
            failure_count: AtomicU32::new(0),
            failure_threshold: failure_threshold.max(1),
            reset_timeout: Duration::from_secs(reset_timeout_secs),
            opened_at: RwLock::new(None),
        }
    }

    async fn is_allowed(&self) -> bool {
        !matches!(self.state().await, CircuitState::Open)
    }

    async fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if self.is_open.swap(false, Ordering::Relaxed) {
            info!("Classifier circuit breaker closed after successful request");
            *self.opened_at.write().await = None;
        }
    }

    async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count < self.failure_threshold {
            return;
        }

        let was_open = self.is_open.swap(true, Ordering::Relaxed);
        if !was_open {
            warn!(
                failure_count = count,
                threshold = self.failure_threshold,
                "Classifier circuit breaker opened due to consecutive failures"
            );
        }
        // A failed half-open probe restarts the wait.
        *self.opened_at.write().await = Some(Instant::now());
    }

    async fn state(&self) -> CircuitState {
        if !self.is_open.load(Ordering::Relaxed) {
            return CircuitState::Closed;
        }

        match *self.opened_at.read().await {
            Some(opened) if opened.elapsed() >= self.reset_timeout => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

// Client

/// Client for the external LLM classification service.
pub struct LlmClassifierClient {
    client: Client,
    config: ClassifierConfig,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl LlmClassifierClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, LlmClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmClassifierError::Http)?;

        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute);
        let circuit_breaker =
            CircuitBreaker::new(config.circuit_breaker_failures, config.circuit_breaker_reset_secs);

        Ok(Self {
            client,
            config,
            rate_limiter,
            circuit_breaker,
        })
    }

    pub fn is_available(&self) -> bool {
        self.config.enabled && !self.config.base_url.is_empty()
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state().await
    }

    /// Ask the service to classify a prompt.
    pub async fn classify_prompt(
        &self,
        prompt: &str,
    ) -> Result<PromptClassification, LlmClassifierError> {
        if !self.config.enabled {
            return Err(LlmClassifierError::Disabled);
        }
        if self.config.base_url.is_empty() {
            return Err(LlmClassifierError::NotConfigured);
        }
        if !self.circuit_breaker.is_allowed().await {
            return Err(LlmClassifierError::CircuitOpen);
        }
        if !self.rate_limiter.try_acquire() {
            return Err(LlmClassifierError::RateLimited);
        }

        let start = Instant::now();
        let result = self.call_classify(prompt).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(classification) => {
                self.circuit_breaker.record_success().await;
                debug!(
                    relevant = classification.is_relevant,
                    optimize_battery = classification.optimize_battery,
                    optimize_data = classification.optimize_data,
                    duration_ms,
                    "External classification successful"
                );
                Ok(classification)
            }
            Err(e) => {
                self.circuit_breaker.record_failure().await;
                error!(error = %e, duration_ms, "External classification failed");
                Err(e)
            }
        }
    }

    async fn call_classify(&self, prompt: &str) -> Result<PromptClassification, LlmClassifierError> {
        let url = format!("{}/classify", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&ClassifyRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmClassifierError::Timeout(self.config.timeout_ms)
                } else {
                    LlmClassifierError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClassifierError::ServiceError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| LlmClassifierError::InvalidResponse(e.to_string()))?;

        Ok(body.into())
    }
}

#[async_trait::async_trait]
impl ExternalClassifier for LlmClassifierClient {
    async fn classify(&self, prompt: &str) -> Result<PromptClassification, ClassifierError> {
        self.classify_prompt(prompt).await.map_err(ClassifierError::from)
    }
}

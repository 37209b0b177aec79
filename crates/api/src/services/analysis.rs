//! Request-scoped orchestration around the optimization engine.
//!
//! Adds the pieces the pure engine leaves to its host: a concurrency cap,
//! a wall-clock timeout, the optional external classifier and pattern
//! persistence.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use domain::config::{AppCatalog, StrategyConfig};
use domain::models::{AnalysisResult, DeviceSnapshot, PromptClassification, ResponseType};
use domain::services::{
    classify_with_fallback, persist_usage_patterns, AnalysisOutcome, ExternalClassifier,
    OptimizationEngine, RandomSampler, UsagePatternStore,
};
use domain::AnalysisError;

use crate::config::Config;
use crate::middleware::metrics::{record_analysis, record_classification};

/// Shared analysis service, one per process.
pub struct AnalysisService {
    engine: Arc<OptimizationEngine>,
    store: Arc<dyn UsagePatternStore>,
    classifier: Option<Arc<dyn ExternalClassifier>>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Duration,
    classifier_timeout: Duration,
    savings_seed: Option<u64>,
}

impl AnalysisService {
    pub fn new(
        config: &Config,
        store: Arc<dyn UsagePatternStore>,
        classifier: Option<Arc<dyn ExternalClassifier>>,
    ) -> Self {
        let strategy_config =
            StrategyConfig::default().with_default_data_plan(config.analysis.default_data_plan_mb);
        let engine = OptimizationEngine::new(
            Arc::new(strategy_config),
            Arc::new(AppCatalog::default()),
        );

        Self {
            engine: Arc::new(engine),
            store,
            classifier,
            permits: Arc::new(Semaphore::new(config.analysis.max_concurrent)),
            max_concurrent: config.analysis.max_concurrent,
            timeout: Duration::from_millis(config.analysis.timeout_ms),
            classifier_timeout: Duration::from_millis(config.classifier.timeout_ms),
            savings_seed: config.analysis.savings_seed,
        }
    }

    /// Run one analysis. Always produces a result; failures become error results.
    pub async fn analyze(&self, snapshot: DeviceSnapshot) -> AnalysisResult {
        let Ok(_permit) = self.permits.clone().try_acquire_owned() else {
            let error = AnalysisError::RateLimit(format!(
                "{} analyses already in flight",
                self.max_concurrent
            ));
            tracing::warn!(device_id = %snapshot.device_id, error = %error, "Analysis rejected");
            record_analysis(ResponseType::Error);
            return AnalysisResult::from_error(&error);
        };

        let prompt = snapshot.prompt_text().unwrap_or("").to_string();
        let classification = match &self.classifier {
            Some(classifier) if OptimizationEngine::wants_goal_classification(&prompt) => {
                let (classification, source) = classify_with_fallback(
                    &prompt,
                    Some(classifier.as_ref()),
                    self.classifier_timeout,
                )
                .await;
                record_classification(source);
                Some(classification)
            }
            _ => None,
        };

        let snapshot = Arc::new(snapshot);
        let outcome = self.run_engine(snapshot.clone(), classification).await;
        record_analysis(outcome.result.response_type);

        if outcome.should_store_patterns() {
            let normalized = snapshot.as_ref().clone().normalized();
            persist_usage_patterns(
                self.store.as_ref(),
                &normalized,
                &outcome.protected_apps,
                Utc::now(),
            )
            .await;
        }

        outcome.result
    }

    async fn run_engine(
        &self,
        snapshot: Arc<DeviceSnapshot>,
        classification: Option<PromptClassification>,
    ) -> AnalysisOutcome {
        let engine = self.engine.clone();
        let seed = self.savings_seed;
        let task = tokio::task::spawn_blocking(move || {
            let mut sampler = match seed {
                Some(seed) => RandomSampler::seeded(seed),
                None => RandomSampler::from_entropy(),
            };
            engine.evaluate(&snapshot, None, classification, &mut sampler)
        });

        let error = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(join_error)) => AnalysisError::General(join_error.to_string()),
            Err(_) => AnalysisError::Timeout(self.timeout.as_millis() as u64),
        };

        tracing::error!(error = %error, "Analysis task did not complete");
        AnalysisOutcome::failed(&error)
    }
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("max_concurrent", &self.max_concurrent)
            .field("timeout", &self.timeout)
            .field("classifier", &self.classifier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::InsightType;
    use domain::services::{InMemoryPatternStore, MockExternalClassifier};
    use serde_json::json;

    fn snapshot(prompt: &str) -> DeviceSnapshot {
        serde_json::from_value(json!({
            "deviceId": "device-1",
            "timestamp": 1700000000,
            "battery": { "level": 45.0, "isCharging": false },
            "memory": { "totalRam": 8000.0, "availableRam": 4000.0, "lowMemory": false },
            "cpu": { "usage": 20.0 },
            "network": {
                "type": "WIFI",
                "isRoaming": false,
                "dataUsage": { "foreground": 100.0, "background": 50.0 }
            },
            "apps": [
                {
                    "packageName": "com.spotify.music",
                    "appName": "Spotify",
                    "isSystemApp": false,
                    "lastUsed": 1700000000,
                    "foregroundTime": 4000.0,
                    "backgroundTime": 2000.0,
                    "batteryUsage": 22.0,
                    "dataUsage": { "foreground": 300.0, "background": 250.0 }
                }
            ],
            "prompt": prompt
        }))
        .unwrap()
    }

    fn config() -> Config {
        Config::load_for_test(&[("analysis.savings_seed", "7")]).unwrap()
    }

    #[tokio::test]
    async fn test_optimization_stores_patterns() {
        let store = Arc::new(InMemoryPatternStore::new());
        let service = AnalysisService::new(&config(), store.clone(), None);

        let result = service.analyze(snapshot("save battery")).await;
        assert!(result.success);
        assert_eq!(result.response_type, ResponseType::Optimization);

        let patterns = store.list_patterns("device-1").await.unwrap();
        assert!(patterns["com.spotify.music"].contains("Very high battery usage"));
    }

    #[tokio::test]
    async fn test_information_does_not_store_patterns() {
        let store = Arc::new(InMemoryPatternStore::new());
        let service = AnalysisService::new(&config(), store.clone(), None);

        let result = service.analyze(snapshot("show me the top battery apps")).await;
        assert_eq!(result.response_type, ResponseType::Information);
        assert!(store.list_patterns("device-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(InMemoryPatternStore::failing());
        let service = AnalysisService::new(&config(), store, None);

        let result = service.analyze(snapshot("save battery")).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_external_classifier_used_for_vague_prompt() {
        let mut answer = PromptClassification::irrelevant();
        answer.is_relevant = true;
        answer.optimize_data = true;
        let classifier: Arc<dyn ExternalClassifier> =
            Arc::new(MockExternalClassifier::returning(answer));
        let service = AnalysisService::new(
            &config(),
            Arc::new(InMemoryPatternStore::new()),
            Some(classifier),
        );

        let result = service.analyze(snapshot("my phone feels sluggish")).await;
        assert!(result.success);
        assert!(result.estimated_savings.data_mb > 0);
    }

    #[tokio::test]
    async fn test_no_permits_yields_rate_limit_result() {
        let cfg = Config::load_for_test(&[("analysis.max_concurrent", "1")]).unwrap();
        let service = AnalysisService::new(&cfg, Arc::new(InMemoryPatternStore::new()), None);
        let _held = service.permits.clone().try_acquire_owned().unwrap();

        let result = service.analyze(snapshot("save battery")).await;
        assert!(!result.success);
        assert_eq!(result.error_category(), Some(InsightType::RateLimit));
        assert_eq!(result.battery_score, 0.0);
    }
}

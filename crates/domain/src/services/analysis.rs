//! The optimization pipeline entry point.
//!
//! normalize → classify/extract → resolve → balance → insights and savings →
//! actionables → fallbacks → scores. Stage failures never escape; they are
//! rendered as an error result.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use super::constraint_extractor::{ConstraintExtractor, Constraints};
use super::insight_generator::{self, InsightContext};
use super::priority_balancer::{self, ResourceState};
use super::savings_calculator::{self, SavingsSampler};
use super::strategy_resolver::{self, ResolverInput};
use super::{actionable_generator, prompt_classifier, scoring};
use crate::config::{AppCatalog, StrategyConfig};
use crate::error::AnalysisError;
use crate::models::{
    Activity, AnalysisResult, DeviceSnapshot, EstimatedSavings, PromptClassification,
    ResponseType, Strategy,
};

/// Result plus the strategy it was built from.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// `None` for error results
    pub strategy: Option<Strategy>,
    /// Installed apps the strategy kept running
    pub protected_apps: BTreeSet<String>,
}

impl AnalysisOutcome {
    pub fn failed(error: &AnalysisError) -> Self {
        Self {
            result: AnalysisResult::from_error(error),
            strategy: None,
            protected_apps: BTreeSet::new(),
        }
    }

    /// Usage patterns are recorded only after an optimization response.
    pub fn should_store_patterns(&self) -> bool {
        self.result.success && self.result.response_type == ResponseType::Optimization
    }
}

/// Which kind of answer the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    YesNo(Activity),
    Information,
    Optimization,
}

impl RequestKind {
    fn of(prompt: &str) -> Self {
        if let Some(activity) = prompt_classifier::yes_no_activity(prompt) {
            RequestKind::YesNo(activity)
        } else if prompt_classifier::is_information_request(prompt) {
            RequestKind::Information
        } else {
            RequestKind::Optimization
        }
    }
}

/// Turns a device snapshot and an optional goal into an [`AnalysisResult`].
///
/// Holds only immutable tables, so one engine is shared by every request.
#[derive(Debug, Clone)]
pub struct OptimizationEngine {
    config: Arc<StrategyConfig>,
    catalog: Arc<AppCatalog>,
    extractor: ConstraintExtractor,
}

impl OptimizationEngine {
    pub fn new(config: Arc<StrategyConfig>, catalog: Arc<AppCatalog>) -> Self {
        let extractor = ConstraintExtractor::new(&catalog);
        Self {
            config,
            catalog,
            extractor,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Whether the prompt needs the external classifier at all: feasibility
    /// questions and information requests are answered without goals.
    pub fn wants_goal_classification(prompt: &str) -> bool {
        RequestKind::of(prompt.trim()) == RequestKind::Optimization
    }

    /// Analyze with the rule classifier. `prompt` overrides the snapshot's own.
    pub fn analyze(
        &self,
        snapshot: &DeviceSnapshot,
        prompt: Option<&str>,
        sampler: &mut dyn SavingsSampler,
    ) -> AnalysisResult {
        self.evaluate(snapshot, prompt, None, sampler).result
    }

    /// Analyze with a classification computed elsewhere.
    pub fn analyze_classified(
        &self,
        snapshot: &DeviceSnapshot,
        prompt: Option<&str>,
        classification: PromptClassification,
        sampler: &mut dyn SavingsSampler,
    ) -> AnalysisResult {
        self.evaluate(snapshot, prompt, Some(classification), sampler)
            .result
    }

    /// Full pipeline run, keeping the final strategy for pattern storage.
    pub fn evaluate(
        &self,
        snapshot: &DeviceSnapshot,
        prompt: Option<&str>,
        classification: Option<PromptClassification>,
        sampler: &mut dyn SavingsSampler,
    ) -> AnalysisOutcome {
        let span = tracing::info_span!("analyze", device_id = %snapshot.device_id);
        let _enter = span.enter();

        match self.run(snapshot, prompt, classification, sampler) {
            Ok(outcome) => {
                tracing::info!(
                    response_type = %outcome.result.response_type,
                    actionables = outcome.result.actionable.len(),
                    insights = outcome.result.insights.len(),
                    "Analysis complete"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, category = ?e.category(), "Analysis failed");
                AnalysisOutcome::failed(&e)
            }
        }
    }

    fn run(
        &self,
        snapshot: &DeviceSnapshot,
        prompt: Option<&str>,
        classification: Option<PromptClassification>,
        sampler: &mut dyn SavingsSampler,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        snapshot.validate()?;
        self.config
            .validate()
            .map_err(|e| AnalysisError::General(e.to_string()))?;

        let snapshot = snapshot.clone().normalized();
        let prompt = prompt
            .map(str::trim)
            .or_else(|| snapshot.prompt_text())
            .unwrap_or("")
            .to_string();

        let constraints = self.extractor.extract(&prompt);
        let kind = RequestKind::of(&prompt);
        let classification = classification
            .map(PromptClassification::normalized)
            .unwrap_or_else(|| prompt_classifier::classify(&prompt));
        let classification = prompt_classifier::apply_constraints(classification, &constraints);

        tracing::debug!(
            kind = ?kind,
            relevant = classification.is_relevant,
            optimize_battery = classification.optimize_battery,
            optimize_data = classification.optimize_data,
            "Classified prompt"
        );

        let strategy = self.strategy_for(&snapshot, &classification, &constraints);
        let protected = actionable_generator::installed_protected(&strategy, &snapshot, &self.catalog);

        let (response_type, insights, actionable, savings, strategy) = match kind {
            RequestKind::YesNo(activity) => {
                // The answer quotes battery savings even for an otherwise
                // irrelevant prompt.
                let strategy = Strategy {
                    show_battery_savings: true,
                    ..strategy
                };
                let savings =
                    savings_calculator::calculate(&strategy, protected.len(), &self.config, sampler);
                let insight = insight_generator::yes_no_insight(
                    activity,
                    snapshot.battery_level(),
                    constraints.time_hours,
                    savings,
                    &self.config,
                );
                (ResponseType::Information, vec![insight], Vec::new(), savings, strategy)
            }
            RequestKind::Information => {
                let insights = insight_generator::information_insights(
                    &prompt,
                    &snapshot,
                    &constraints,
                    &self.catalog,
                    &self.config,
                );
                (
                    ResponseType::Information,
                    insights,
                    Vec::new(),
                    EstimatedSavings::default(),
                    strategy,
                )
            }
            RequestKind::Optimization => {
                let savings =
                    savings_calculator::calculate(&strategy, protected.len(), &self.config, sampler);
                let insights = insight_generator::optimization_insights(&InsightContext {
                    strategy: &strategy,
                    snapshot: &snapshot,
                    protected: &protected,
                    savings,
                    catalog: &self.catalog,
                    config: &self.config,
                });
                let actionable =
                    actionable_generator::generate(&strategy, &snapshot, &self.catalog, &self.config);
                (ResponseType::Optimization, insights, actionable, savings, strategy)
            }
        };

        let insights = insight_generator::with_fallback(insights);
        let scores = scoring::score(&snapshot);
        let message = match response_type {
            ResponseType::Optimization => format!(
                "Generated {} optimization actions for {}",
                actionable.len(),
                strategy.focus
            ),
            _ => "Answered your question using current device data".to_string(),
        };

        Ok(AnalysisOutcome {
            result: AnalysisResult {
                id: AnalysisResult::generate_id(),
                success: true,
                timestamp: Utc::now().timestamp(),
                message,
                response_type,
                actionable,
                insights,
                battery_score: scores.battery,
                data_score: scores.data,
                performance_score: scores.performance,
                estimated_savings: savings,
            },
            strategy: Some(strategy),
            protected_apps: protected,
        })
    }

    fn strategy_for(
        &self,
        snapshot: &DeviceSnapshot,
        classification: &PromptClassification,
        constraints: &Constraints,
    ) -> Strategy {
        let resolved = strategy_resolver::resolve(
            &ResolverInput {
                battery_level: snapshot.battery_level(),
                classification,
                constraints,
            },
            &self.config,
        );
        let state = ResourceState::from_snapshot(snapshot, constraints, &self.config);
        let balanced = priority_balancer::balance(resolved, &state, &self.config);
        tracing::debug!(
            focus = %balanced.focus,
            aggressiveness = %balanced.aggressiveness,
            protected = balanced.protected_apps.len(),
            "Resolved strategy"
        );
        balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActionableType, AppUsageRecord, Focus, InsightSeverity, InsightType, DataUsage,
        TargetMode, SYSTEM_TARGET,
    };
    use crate::services::savings_calculator::{MidpointSampler, RandomSampler};

    fn engine() -> OptimizationEngine {
        OptimizationEngine::new(
            Arc::new(StrategyConfig::default()),
            Arc::new(AppCatalog::default()),
        )
    }

    fn app(package: &str, name: &str, battery: f64, data_mb: f64) -> AppUsageRecord {
        AppUsageRecord {
            package_name: package.to_string(),
            app_name: name.to_string(),
            battery_usage: Some(battery),
            data_usage: Some(DataUsage {
                foreground: Some(data_mb * 0.4),
                background: Some(data_mb * 0.6),
                ..Default::default()
            }),
            foreground_time: Some(1200.0),
            ..Default::default()
        }
    }

    fn snapshot(level: f64) -> DeviceSnapshot {
        let mut s = DeviceSnapshot {
            device_id: "device-001".to_string(),
            timestamp: 1_686_123_456,
            apps: vec![
                app("com.example.video", "Video", 18.0, 400.0),
                app("com.whatsapp", "WhatsApp", 6.0, 30.0),
                app("com.example.game", "Game", 12.0, 80.0),
            ],
            ..Default::default()
        };
        s.battery.level = Some(level);
        s
    }

    #[test]
    fn test_empty_prompt_optimizes_both() {
        let engine = engine();
        let outcome = engine.evaluate(&snapshot(50.0), Some(""), None, &mut MidpointSampler);
        let result = &outcome.result;
        assert!(result.success);
        assert_eq!(result.response_type, ResponseType::Optimization);
        assert_eq!(outcome.strategy.as_ref().unwrap().focus, Focus::Both);
        assert!(outcome.should_store_patterns());

        let globals: Vec<_> = result
            .actionable
            .iter()
            .filter(|a| a.package_name == SYSTEM_TARGET)
            .map(|a| a.actionable_type)
            .collect();
        assert!(globals.contains(&ActionableType::ManageWakeLocks));
        assert!(globals.contains(&ActionableType::EnableDataSaver));
    }

    #[test]
    fn test_savings_consistent_with_strategy_insight() {
        let engine = engine();
        for seed in 0..10 {
            let result = engine.analyze(&snapshot(50.0), Some(""), &mut RandomSampler::seeded(seed));
            let strategy = result
                .insights
                .iter()
                .find(|i| i.insight_type == InsightType::Strategy)
                .unwrap();
            let savings = result.estimated_savings;
            assert!(strategy
                .description
                .contains(&format!("{} minutes", savings.battery_minutes)));
            assert!(strategy.description.contains(&format!("{} MB", savings.data_mb)));
        }
    }

    #[test]
    fn test_yes_no_has_no_actionables() {
        let engine = engine();
        let result = engine.analyze(
            &snapshot(40.0),
            Some("Can I stream Netflix for 2 hours?"),
            &mut MidpointSampler,
        );
        assert!(result.success);
        assert_eq!(result.response_type, ResponseType::Information);
        assert!(result.actionable.is_empty());
        assert_eq!(result.insights.len(), 1);
        let answer = &result.insights[0];
        assert_eq!(answer.insight_type, InsightType::YesNo);
        assert!(answer.title == "Yes, with optimization" || answer.title.starts_with("No"));
        assert!(answer
            .description
            .contains(&result.estimated_savings.battery_minutes.to_string()));
    }

    #[test]
    fn test_information_request() {
        let engine = engine();
        let outcome = engine.evaluate(
            &snapshot(60.0),
            Some("Which apps are using the most battery?"),
            None,
            &mut MidpointSampler,
        );
        assert_eq!(outcome.result.response_type, ResponseType::Information);
        assert!(outcome.result.actionable.is_empty());
        assert!(!outcome.should_store_patterns());
        assert_eq!(
            outcome.result.insights[0].insight_type,
            InsightType::BatteryInformation
        );
        assert!(outcome.result.insights[0].description.contains("- Video: 18.0%"));
    }

    #[test]
    fn test_critical_battery_override() {
        let engine = engine();
        let outcome = engine.evaluate(
            &snapshot(10.0),
            Some("optimize data only"),
            None,
            &mut MidpointSampler,
        );
        let strategy = outcome.strategy.unwrap();
        assert!(matches!(strategy.focus, Focus::Battery | Focus::Both));
        assert_eq!(
            strategy.aggressiveness,
            crate::models::Aggressiveness::VeryAggressive
        );
        assert!(outcome
            .result
            .insights
            .iter()
            .any(|i| i.insight_type == InsightType::BatteryWarning
                && i.severity == InsightSeverity::High));
    }

    #[test]
    fn test_high_battery_low_data_override() {
        let engine = engine();
        let mut s = snapshot(85.0);
        s.total_data_mb = Some(1000.0);
        s.current_data_mb = Some(800.0);
        let outcome = engine.evaluate(&s, Some("optimize my battery"), None, &mut MidpointSampler);
        assert_eq!(outcome.strategy.unwrap().focus, Focus::Data);
    }

    #[test]
    fn test_protected_app_keeps_normal_priority() {
        let engine = engine();
        let result = engine.analyze(
            &snapshot(20.0),
            Some("save battery but keep whatsapp working"),
            &mut MidpointSampler,
        );
        let whatsapp: Vec<_> = result
            .actionable
            .iter()
            .filter(|a| a.package_name == "com.whatsapp")
            .collect();
        assert_eq!(whatsapp.len(), 1);
        assert_eq!(whatsapp[0].new_mode, TargetMode::Normal);
    }

    #[test]
    fn test_category_protection_ignores_missing_apps() {
        let engine = engine();
        let mut device = snapshot(60.0);
        device.apps = vec![app("com.example.game", "Game", 12.0, 80.0)];

        let plain = engine.evaluate(&device, Some("save battery"), None, &mut MidpointSampler);
        let guarded = engine.evaluate(
            &device,
            Some("save battery but keep my messages and maps"),
            None,
            &mut MidpointSampler,
        );

        assert!(guarded.protected_apps.is_empty());
        assert_eq!(
            guarded.result.estimated_savings,
            plain.result.estimated_savings
        );
        assert!(!guarded
            .result
            .insights
            .iter()
            .any(|i| i.insight_type == InsightType::CriticalApps));
    }

    #[test]
    fn test_category_protection_counts_installed_apps() {
        let engine = engine();
        let outcome = engine.evaluate(
            &snapshot(60.0),
            Some("save battery but keep my messages and maps"),
            None,
            &mut MidpointSampler,
        );

        assert_eq!(
            outcome.protected_apps,
            BTreeSet::from(["com.whatsapp".to_string()])
        );
        let critical = outcome
            .result
            .insights
            .iter()
            .find(|i| i.insight_type == InsightType::CriticalApps)
            .unwrap();
        assert_eq!(critical.description, "Maintaining full functionality for: WhatsApp");
    }

    #[test]
    fn test_critical_battery_surfaces_savings_for_irrelevant_prompt() {
        let result = engine().analyze(&snapshot(8.0), Some("good morning"), &mut MidpointSampler);
        assert_eq!(result.response_type, ResponseType::Optimization);
        assert!(result.estimated_savings.battery_minutes > 0);
    }

    #[test]
    fn test_external_classification_used() {
        let engine = engine();
        let mut classification = PromptClassification::irrelevant();
        classification.is_relevant = true;
        classification.optimize_data = true;
        let outcome = engine.evaluate(
            &snapshot(60.0),
            Some("help me with my trip"),
            Some(classification),
            &mut MidpointSampler,
        );
        assert_eq!(outcome.strategy.unwrap().focus, Focus::Data);
    }

    #[test]
    fn test_invalid_snapshot_becomes_error_result() {
        let engine = engine();
        let mut s = snapshot(50.0);
        s.device_id = String::new();
        let result = engine.analyze(&s, None, &mut MidpointSampler);
        assert!(!result.success);
        assert_eq!(result.response_type, ResponseType::Error);
        assert_eq!(result.error_category(), Some(InsightType::Validation));
        assert!(result.actionable.is_empty());
        assert_eq!(result.battery_score, 0.0);
        assert_eq!(result.estimated_savings, EstimatedSavings::default());
    }

    #[test]
    fn test_snapshot_prompt_used_when_none_given() {
        let engine = engine();
        let mut s = snapshot(60.0);
        s.prompt = Some("Can I play games for 1 hour?".to_string());
        let result = engine.analyze(&s, None, &mut MidpointSampler);
        assert_eq!(result.insights[0].insight_type, InsightType::YesNo);
    }

    #[test]
    fn test_scores_in_range() {
        let result = engine().analyze(&snapshot(50.0), None, &mut MidpointSampler);
        for score in [result.battery_score, result.data_score, result.performance_score] {
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_goal_classification_needed() {
        assert!(OptimizationEngine::wants_goal_classification("help with my trip"));
        assert!(!OptimizationEngine::wants_goal_classification(
            "Can I watch YouTube for 3 hours?"
        ));
    }
}

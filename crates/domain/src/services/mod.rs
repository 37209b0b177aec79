//! Pipeline stages of the optimization engine.
//!
//! Every stage is a pure function of its inputs except savings sampling,
//! which goes through an injected [`SavingsSampler`].

pub mod actionable_generator;
pub mod analysis;
pub mod constraint_extractor;
pub mod external_classifier;
pub mod insight_generator;
pub mod priority_balancer;
pub mod prompt_classifier;
pub mod rules;
pub mod savings_calculator;
pub mod scoring;
pub mod strategy_resolver;
pub mod usage_patterns;

pub use analysis::{AnalysisOutcome, OptimizationEngine};
pub use constraint_extractor::{ConstraintExtractor, Constraints};
pub use external_classifier::{ClassifierError, ExternalClassifier, MockExternalClassifier};
pub use priority_balancer::ResourceState;
pub use prompt_classifier::{classify_with_fallback, ClassificationSource};
pub use rules::{Rule, RuleSet};
pub use savings_calculator::{MidpointSampler, RandomSampler, SavingsSampler};
pub use usage_patterns::{
    describe_usage, persist_usage_patterns, InMemoryPatternStore, StoreError, UsagePatternStore,
};

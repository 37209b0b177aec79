//! Request-level services and external integrations.

pub mod analysis;
pub mod llm_classifier;

pub use analysis::AnalysisService;
pub use llm_classifier::{CircuitState, LlmClassifierClient, LlmClassifierError};

//! Pipeline error types.

use thiserror::Error;

use crate::models::InsightType;

/// Failure of an analysis stage. Never returned to callers of
/// `OptimizationEngine::analyze`; it is rendered as an error result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Analysis timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid device data: {0}")]
    Validation(String),

    #[error("Internal analysis error: {0}")]
    General(String),
}

impl AnalysisError {
    /// Insight type carried by the error response.
    pub fn category(&self) -> InsightType {
        match self {
            AnalysisError::RateLimit(_) => InsightType::RateLimit,
            AnalysisError::Timeout(_) => InsightType::Timeout,
            AnalysisError::Validation(_) => InsightType::Validation,
            AnalysisError::General(_) => InsightType::General,
        }
    }

    /// Text shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::RateLimit(_) => {
                "Too many analyses are running right now. Please try again shortly.".to_string()
            }
            AnalysisError::Timeout(_) => {
                "The analysis took too long to complete. Please try again.".to_string()
            }
            AnalysisError::Validation(msg) => {
                format!("The device data could not be analyzed: {}", msg)
            }
            AnalysisError::General(_) => {
                "An unexpected error occurred while analyzing device data.".to_string()
            }
        }
    }
}

impl From<validator::ValidationErrors> for AnalysisError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        if fields.is_empty() {
            AnalysisError::Validation(errors.to_string())
        } else {
            AnalysisError::Validation(format!("invalid fields: {}", fields.join(", ")))
        }
    }
}

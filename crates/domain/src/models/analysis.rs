//! Analysis result models returned to the request layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::actionable::Actionable;
use super::insight::{Insight, InsightSeverity, InsightType};
use crate::error::AnalysisError;

/// Kind of response produced for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Information,
    Optimization,
    Error,
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseType::Information => write!(f, "information"),
            ResponseType::Optimization => write!(f, "optimization"),
            ResponseType::Error => write!(f, "error"),
        }
    }
}

/// Estimated savings. Computed once per request and shared verbatim with
/// every insight that quotes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedSavings {
    pub battery_minutes: u32,
    #[serde(rename = "dataMB")]
    pub data_mb: u32,
}

/// Resource-health scorecard, each score in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub battery: f64,
    pub data: f64,
    pub performance: f64,
}

impl Scores {
    /// Neutral scores used when a scorer cannot run.
    pub const NEUTRAL: Scores = Scores {
        battery: 50.0,
        data: 50.0,
        performance: 50.0,
    };

    /// Zero scores reported alongside a failed analysis.
    pub const ZERO: Scores = Scores {
        battery: 0.0,
        data: 0.0,
        performance: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub success: bool,
    /// Unix seconds
    pub timestamp: i64,
    pub message: String,
    pub response_type: ResponseType,
    pub actionable: Vec<Actionable>,
    pub insights: Vec<Insight>,
    pub battery_score: f64,
    pub data_score: f64,
    pub performance_score: f64,
    pub estimated_savings: EstimatedSavings,
}

impl AnalysisResult {
    /// Result identifier in the `gen_<unix-millis>` form.
    pub fn generate_id() -> String {
        format!("gen_{}", Utc::now().timestamp_millis())
    }

    /// Render a pipeline failure as a well-formed error response.
    pub fn from_error(error: &AnalysisError) -> Self {
        let category = error.category();
        Self {
            id: Self::generate_id(),
            success: false,
            timestamp: Utc::now().timestamp(),
            message: format!("Analysis failed: {}", error),
            response_type: ResponseType::Error,
            actionable: Vec::new(),
            insights: vec![Insight::new(
                category,
                "Error Analyzing Device Data",
                error.user_message(),
                InsightSeverity::High,
            )],
            battery_score: Scores::ZERO.battery,
            data_score: Scores::ZERO.data,
            performance_score: Scores::ZERO.performance,
            estimated_savings: EstimatedSavings::default(),
        }
    }

    pub fn scores(&self) -> Scores {
        Scores {
            battery: self.battery_score,
            data: self.data_score,
            performance: self.performance_score,
        }
    }

    /// Whether the error insight carries the given category.
    pub fn error_category(&self) -> Option<InsightType> {
        if self.response_type != ResponseType::Error {
            return None;
        }
        self.insights.first().map(|i| i.insight_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_shape() {
        let result = AnalysisResult::from_error(&AnalysisError::Timeout(250));
        assert!(!result.success);
        assert_eq!(result.response_type, ResponseType::Error);
        assert!(result.actionable.is_empty());
        assert_eq!(result.insights.len(), 1);
        assert_eq!(result.insights[0].severity, InsightSeverity::High);
        assert_eq!(result.error_category(), Some(InsightType::Timeout));
        assert_eq!(result.scores(), Scores::ZERO);
        assert_eq!(result.estimated_savings, EstimatedSavings::default());
        assert!(result.id.starts_with("gen_"));
    }

    #[test]
    fn test_savings_wire_format() {
        let savings = EstimatedSavings {
            battery_minutes: 12,
            data_mb: 40,
        };
        let json = serde_json::to_value(savings).unwrap();
        assert_eq!(json["batteryMinutes"], 12);
        assert_eq!(json["dataMB"], 40);
    }

    #[test]
    fn test_result_wire_format() {
        let result = AnalysisResult::from_error(&AnalysisError::General("boom".into()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["responseType"], "error");
        assert_eq!(json["insights"][0]["type"], "General");
        assert!(json.get("batteryScore").is_some());
        assert!(json.get("estimatedSavings").is_some());
    }
}

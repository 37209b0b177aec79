//! Insight models: human-readable explanations attached to a response.

use serde::{Deserialize, Serialize};

/// Insight severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for InsightSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsightSeverity::Low => write!(f, "low"),
            InsightSeverity::Medium => write!(f, "medium"),
            InsightSeverity::High => write!(f, "high"),
        }
    }
}

/// Insight type tag. Serialized with the variant name (`"BatteryWarning"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightType {
    Strategy,
    BatteryWarning,
    DataWarning,
    TimeConstraint,
    CriticalApps,
    BatterySavings,
    DataSavings,
    YesNo,
    BatteryInformation,
    DataInformation,
    Information,
    RateLimit,
    Timeout,
    Validation,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub severity: InsightSeverity,
}

impl Insight {
    pub fn new(
        insight_type: InsightType,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: InsightSeverity,
    ) -> Self {
        Self {
            insight_type,
            title: title.into(),
            description: description.into(),
            severity,
        }
    }
}

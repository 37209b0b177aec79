//! Telemetry normalization helpers.
//!
//! Device agents report readings they could not sample as `-1`. Those
//! sentinels become `None` here, before any arithmetic or comparison sees them.

use serde::{de::IgnoredAny, Deserialize, Deserializer};

/// Value agents send for "unknown".
pub const UNKNOWN_SENTINEL: f64 = -1.0;

/// Maps sentinel, negative, and non-finite readings to `None`.
pub fn normalize_sentinel(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Same as [`normalize_sentinel`] for an already-optional reading.
pub fn normalize_optional(value: Option<f64>) -> Option<f64> {
    value.and_then(normalize_sentinel)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMetric {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawMetric {
    fn into_value(self) -> Option<f64> {
        match self {
            RawMetric::Number(n) => normalize_sentinel(n),
            RawMetric::Text(s) => s.trim().parse::<f64>().ok().and_then(normalize_sentinel),
            RawMetric::Other(_) => None,
        }
    }
}

/// Serde adapter for nullable metrics.
///
/// Accepts a number, a numeric string, `null` or garbage; anything that is not
/// a usable non-negative number decodes to `None`. Pair with `#[serde(default)]`
/// so a missing field is also `None`.
pub fn deserialize_metric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawMetric>::deserialize(deserializer)?;
    Ok(raw.and_then(RawMetric::into_value))
}

/// Serde adapter for counters (crashes, notifications, wakeups).
///
/// Unknown or negative counts decode to zero.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawMetric>::deserialize(deserializer)?;
    Ok(raw
        .and_then(RawMetric::into_value)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}

//! Persisted per-app usage patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text summary of one app's behaviour on one device.
///
/// Keyed by `(device_id, package_name)`; the store keeps at most one row per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePattern {
    pub device_id: String,
    pub package_name: String,
    pub pattern: String,
    pub updated_at: DateTime<Utc>,
}

impl UsagePattern {
    pub fn new(
        device_id: impl Into<String>,
        package_name: impl Into<String>,
        pattern: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            package_name: package_name.into(),
            pattern: pattern.into(),
            updated_at,
        }
    }
}

//! Usage-pattern summaries and the store they are persisted to.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{AppUsageRecord, DeviceSnapshot, UsagePattern};

/// Pattern store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for usage patterns.
///
/// Upserts must be atomic per `(device_id, package_name)` and last-writer-wins
/// on `updated_at`.
#[async_trait::async_trait]
pub trait UsagePatternStore: Send + Sync {
    async fn get_pattern(
        &self,
        device_id: &str,
        package_name: &str,
    ) -> Result<Option<UsagePattern>, StoreError>;

    async fn upsert_pattern(&self, pattern: &UsagePattern) -> Result<(), StoreError>;

    /// Package → pattern text for one device, most recent row per package.
    async fn list_patterns(&self, device_id: &str) -> Result<BTreeMap<String, String>, StoreError>;

    /// All rows, newest first.
    async fn list_all(&self, limit: i64) -> Result<Vec<UsagePattern>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Summarize how an app uses resources. `protected` holds the apps the
/// strategy kept running.
pub fn describe_usage(app: &AppUsageRecord, protected: &BTreeSet<String>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    match app.battery_usage {
        Some(b) if b > 20.0 => parts.push("Very high battery usage"),
        Some(b) if b > 10.0 => parts.push("High battery usage"),
        Some(b) if b > 5.0 => parts.push("Moderate battery usage"),
        _ => {}
    }

    match app.data_usage_mb() {
        Some(d) if d > 500.0 => parts.push("Very high data usage"),
        Some(d) if d > 200.0 => parts.push("High data usage"),
        Some(d) if d > 50.0 => parts.push("Moderate data usage"),
        _ => {}
    }

    match app.foreground_time {
        Some(t) if t > 3600.0 => parts.push("Frequently used in foreground"),
        Some(t) if t > 1800.0 => parts.push("Moderately used in foreground"),
        Some(t) if t < 300.0 => parts.push("Rarely used in foreground"),
        _ => {}
    }

    if protected.contains(&app.package_name) {
        parts.push("Critical app for user");
    }

    if parts.is_empty() {
        "Normal usage pattern".to_string()
    } else {
        parts.join("; ")
    }
}

/// Store one pattern per app. Failures are logged and skipped; returns the
/// number of rows written.
pub async fn persist_usage_patterns(
    store: &dyn UsagePatternStore,
    snapshot: &DeviceSnapshot,
    protected: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> usize {
    let mut stored = 0;
    for app in &snapshot.apps {
        let pattern = UsagePattern::new(
            snapshot.device_id.clone(),
            app.package_name.clone(),
            describe_usage(app, protected),
            now,
        );
        match store.upsert_pattern(&pattern).await {
            Ok(()) => stored += 1,
            Err(e) => tracing::warn!(
                device_id = %snapshot.device_id,
                package_name = %app.package_name,
                error = %e,
                "Failed to store usage pattern"
            ),
        }
    }
    stored
}

/// In-memory store used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    rows: RwLock<HashMap<(String, String), UsagePattern>>,
    fail: bool,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn failing() -> Self {
        Self {
            rows: RwLock::default(),
            fail: true,
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            tracing::warn!("In-memory pattern store simulating failure");
            return Err(StoreError::Unavailable("simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsagePatternStore for InMemoryPatternStore {
    async fn get_pattern(
        &self,
        device_id: &str,
        package_name: &str,
    ) -> Result<Option<UsagePattern>, StoreError> {
        self.check()?;
        let rows = self.rows.read().await;
        Ok(rows
            .get(&(device_id.to_string(), package_name.to_string()))
            .cloned())
    }

    async fn upsert_pattern(&self, pattern: &UsagePattern) -> Result<(), StoreError> {
        self.check()?;
        let key = (pattern.device_id.clone(), pattern.package_name.clone());
        let mut rows = self.rows.write().await;
        match rows.get(&key) {
            Some(existing) if existing.updated_at > pattern.updated_at => {
                tracing::debug!(
                    device_id = %pattern.device_id,
                    package_name = %pattern.package_name,
                    "Ignoring stale usage pattern"
                );
            }
            _ => {
                rows.insert(key, pattern.clone());
            }
        }
        Ok(())
    }

    async fn list_patterns(&self, device_id: &str) -> Result<BTreeMap<String, String>, StoreError> {
        self.check()?;
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|p| p.device_id == device_id)
            .map(|p| (p.package_name.clone(), p.pattern.clone()))
            .collect())
    }

    async fn list_all(&self, limit: i64) -> Result<Vec<UsagePattern>, StoreError> {
        self.check()?;
        let rows = self.rows.read().await;
        let mut all: Vec<UsagePattern> = rows.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

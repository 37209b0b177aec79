//! Usage pattern repository.
//!
//! Upserts are a single `INSERT ... ON CONFLICT` statement, atomic per
//! `(device_id, package_name)`. A row older than the stored one is ignored.

use std::collections::BTreeMap;

use domain::models::UsagePattern;
use domain::services::{StoreError, UsagePatternStore};
use sqlx::PgPool;

use crate::entities::UsagePatternEntity;
use crate::metrics::QueryTimer;

/// Repository for usage patterns.
#[derive(Clone)]
pub struct UsagePatternRepository {
    pool: PgPool,
}

impl UsagePatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

#[async_trait::async_trait]
impl UsagePatternStore for UsagePatternRepository {
    async fn get_pattern(
        &self,
        device_id: &str,
        package_name: &str,
    ) -> Result<Option<UsagePattern>, StoreError> {
        let timer = QueryTimer::new("get_usage_pattern");
        let result = sqlx::query_as::<_, UsagePatternEntity>(
            r#"
            SELECT id, device_id, package_name, pattern, updated_at, created_at
            FROM usage_patterns
            WHERE device_id = $1 AND package_name = $2
            "#,
        )
        .bind(device_id)
        .bind(package_name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.map(UsagePattern::from))
    }

    async fn upsert_pattern(&self, pattern: &UsagePattern) -> Result<(), StoreError> {
        let timer = QueryTimer::new("upsert_usage_pattern");
        let result = sqlx::query_as::<_, UsagePatternEntity>(
            r#"
            INSERT INTO usage_patterns (device_id, package_name, pattern, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (device_id, package_name) DO UPDATE
            SET pattern = EXCLUDED.pattern,
                updated_at = EXCLUDED.updated_at
            WHERE usage_patterns.updated_at <= EXCLUDED.updated_at
            RETURNING id, device_id, package_name, pattern, updated_at, created_at
            "#,
        )
        .bind(&pattern.device_id)
        .bind(&pattern.package_name)
        .bind(&pattern.pattern)
        .bind(pattern.updated_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if result.map_err(store_error)?.is_none() {
            tracing::debug!(
                device_id = %pattern.device_id,
                package_name = %pattern.package_name,
                "Stored usage pattern is newer, update ignored"
            );
        }
        Ok(())
    }

    async fn list_patterns(&self, device_id: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let timer = QueryTimer::new("list_usage_patterns");
        let result = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT DISTINCT ON (package_name) package_name, pattern
            FROM usage_patterns
            WHERE device_id = $1
            ORDER BY package_name, updated_at DESC
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(store_error)?.into_iter().collect())
    }

    async fn list_all(&self, limit: i64) -> Result<Vec<UsagePattern>, StoreError> {
        let timer = QueryTimer::new("list_all_usage_patterns");
        let result = sqlx::query_as::<_, UsagePatternEntity>(
            r#"
            SELECT id, device_id, package_name, pattern, updated_at, created_at
            FROM usage_patterns
            ORDER BY updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(UsagePattern::from)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let timer = QueryTimer::new("ping");
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        timer.record();
        crate::metrics::record_pool_metrics(&self.pool);
        result.map(|_| ()).map_err(store_error)
    }
}

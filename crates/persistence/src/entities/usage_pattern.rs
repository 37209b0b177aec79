//! Usage pattern database entity.

use chrono::{DateTime, Utc};
use domain::models::UsagePattern;
use sqlx::FromRow;

/// Row of the `usage_patterns` table.
#[derive(Debug, Clone, FromRow)]
pub struct UsagePatternEntity {
    pub id: i64,
    pub device_id: String,
    pub package_name: String,
    pub pattern: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<UsagePatternEntity> for UsagePattern {
    fn from(entity: UsagePatternEntity) -> Self {
        UsagePattern::new(
            entity.device_id,
            entity.package_name,
            entity.pattern,
            entity.updated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_into_domain() {
        let now = Utc::now();
        let entity = UsagePatternEntity {
            id: 7,
            device_id: "device-001".to_string(),
            package_name: "com.whatsapp".to_string(),
            pattern: "High battery usage".to_string(),
            updated_at: now,
            created_at: now,
        };
        let pattern: UsagePattern = entity.into();
        assert_eq!(pattern.device_id, "device-001");
        assert_eq!(pattern.pattern, "High battery usage");
        assert_eq!(pattern.updated_at, now);
    }
}

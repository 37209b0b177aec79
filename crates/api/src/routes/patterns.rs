//! Usage pattern endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::UsagePattern;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ListPatternsQuery {
    pub limit: Option<i64>,
}

impl ListPatternsQuery {
    fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

/// Patterns recorded for one device, keyed by package.
///
/// GET /api/v1/patterns/:device_id
pub async fn get_device_patterns(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    shared::validation::validate_device_id(&device_id)
        .map_err(|_| ApiError::validation(format!("Invalid device id: {}", device_id)))?;

    let patterns = state.store.list_patterns(&device_id).await?;
    Ok(Json(patterns))
}

/// Every stored pattern, newest first.
///
/// GET /api/v1/patterns?limit=<n>
pub async fn list_patterns(
    State(state): State<AppState>,
    Query(query): Query<ListPatternsQuery>,
) -> Result<Json<Vec<UsagePattern>>, ApiError> {
    let patterns = state.store.list_all(query.effective_limit()).await?;
    Ok(Json(patterns))
}

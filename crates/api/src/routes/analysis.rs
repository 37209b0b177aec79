//! Analysis endpoint handler.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{AnalysisResult, DeviceSnapshot};

/// Analyze a device snapshot.
///
/// POST /api/v1/analyze
///
/// Malformed or invalid snapshots are rejected with 400. Anything that fails
/// later in the pipeline is still a 200 carrying an error-type result.
pub async fn analyze_device(
    State(state): State<AppState>,
    payload: Result<Json<DeviceSnapshot>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(snapshot) = payload?;
    snapshot.validate()?;

    tracing::info!(
        device_id = %snapshot.device_id,
        apps = snapshot.apps.len(),
        has_prompt = snapshot.prompt_text().is_some(),
        "Analysis requested"
    );

    let result = state.analysis.analyze(snapshot).await;
    Ok(Json(result))
}

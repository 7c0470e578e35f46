use axum::extract::{Path, State};
use axum::response::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::RiskSnapshot;
use crate::AppState;

/// GET /api/v1/risk/:user_id
///
/// Runs the pipeline end to end and returns the fresh snapshot. Alerts
/// and audit records produced by the run are persisted as a side effect.
pub async fn evaluate_risk(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RiskSnapshot>, AppError> {
    let snapshot = state.orchestrator.evaluate_user(user_id).await?;
    Ok(Json(snapshot))
}

/// GET /api/v1/risk/:user_id/cached
///
/// Last published snapshot without recomputation; 404 until the first
/// pipeline run for this user completes.
pub async fn cached_risk(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RiskSnapshot>, AppError> {
    state
        .snapshots
        .get(user_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no risk snapshot for user {}", user_id)))
}

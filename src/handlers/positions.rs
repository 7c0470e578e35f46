use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Position, PositionDelta};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertPositionRequest {
    pub user_id: Uuid,
    pub asset_id: Uuid,
    /// What the caller did: "supply", "borrow", "repay", "withdraw".
    /// Echoed into the transaction_complete alert.
    pub action: String,
    #[serde(default)]
    pub delta: PositionDelta,
}

/// GET /api/v1/positions/:user_id
pub async fn get_positions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PositionsResponse>, AppError> {
    let positions = state.position_store.get_positions(user_id).await?;
    let total = positions.len();
    Ok(Json(PositionsResponse { positions, total }))
}

/// POST /api/v1/positions
///
/// Applies a signed delta to one (user, asset) position and confirms with
/// a transaction_complete alert. Validation failures reject the whole
/// delta without partial application.
pub async fn upsert_position(
    State(state): State<AppState>,
    Json(request): Json<UpsertPositionRequest>,
) -> Result<Json<Position>, AppError> {
    if request.action.trim().is_empty() {
        return Err(AppError::ValidationError("action must not be empty".to_string()));
    }

    let position = state
        .position_store
        .upsert_position(request.user_id, request.asset_id, request.delta)
        .await?;

    state
        .alert_engine
        .notify_transaction_complete(request.user_id, request.asset_id, &request.action)
        .await?;

    tracing::info!(
        user_id = %request.user_id,
        asset_id = %request.asset_id,
        action = %request.action,
        "position updated"
    );

    Ok(Json(position))
}

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AlertEvent;
use crate::AppState;

const DEFAULT_ALERT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertEvent>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/v1/alerts/:user_id
pub async fn list_alerts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<AlertsResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    let alerts = state.alert_store.list(user_id, limit).await?;
    let total = alerts.len();
    Ok(Json(AlertsResponse { alerts, total }))
}

/// PUT /api/v1/alerts/:id/read
pub async fn mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.alert_store.mark_read(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "read": true })))
}

/// PUT /api/v1/alerts/:user_id/read-all
pub async fn mark_all_alerts_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = state.alert_store.mark_all_read(user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::MonitorKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonitorQuery {
    /// Restrict to one kind; all four when omitted.
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonitorResponse {
    pub user_id: Uuid,
    pub active: Vec<MonitorKind>,
}

/// POST /api/v1/monitor/:user_id
pub async fn start_monitoring(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<MonitorQuery>,
) -> Result<Json<MonitorResponse>, AppError> {
    match query.kind.as_deref() {
        Some(kind) => {
            state.monitoring.subscribe(user_id, kind.parse()?);
        }
        None => {
            state.monitoring.subscribe_all(user_id);
        }
    }
    Ok(Json(MonitorResponse {
        user_id,
        active: state.monitoring.active_monitors(user_id),
    }))
}

/// DELETE /api/v1/monitor/:user_id
pub async fn stop_monitoring(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<MonitorQuery>,
) -> Result<Json<MonitorResponse>, AppError> {
    match query.kind.as_deref() {
        Some(kind) => {
            state.monitoring.unsubscribe(user_id, kind.parse()?);
        }
        None => {
            state.monitoring.unsubscribe_all(user_id);
        }
    }
    Ok(Json(MonitorResponse {
        user_id,
        active: state.monitoring.active_monitors(user_id),
    }))
}

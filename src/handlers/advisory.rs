use axum::extract::State;
use axum::response::Json;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::{AdvisoryContext, AdvisoryReply};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub user_id: Uuid,
    pub message: String,
}

/// POST /api/v1/advisory
///
/// Answers a free-text question with the user's live numbers as context.
/// Uses the cached snapshot when one exists; a first-time caller gets a
/// fresh pipeline run instead.
pub async fn ask_advisory(
    State(state): State<AppState>,
    Json(request): Json<AdvisoryRequest>,
) -> Result<Json<AdvisoryReply>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::ValidationError("message must not be empty".to_string()));
    }

    let snapshot = match state.snapshots.get(request.user_id).await {
        Some(snapshot) => snapshot,
        None => state.orchestrator.evaluate_user(request.user_id).await?,
    };

    let positions = state.position_store.get_positions(request.user_id).await?;
    let context = AdvisoryContext {
        total_supplied: snapshot.stats.total_supplied.to_f64().unwrap_or(0.0),
        total_borrowed: snapshot.stats.total_borrowed.to_f64().unwrap_or(0.0),
        health_factor: snapshot.stats.health_factor.to_f64().unwrap_or(0.0),
        has_debt: snapshot.stats.has_debt,
        risk_score: snapshot.stats.risk_score,
        position_count: positions.len(),
    };

    let reply = state.advisory.ask(request.user_id, &request.message, &context).await;

    state
        .audit_log
        .append(
            request.user_id,
            "advisory",
            json!({
                "message": request.message,
                "model": reply.model,
                "risk_score": context.risk_score,
            }),
        )
        .await;

    Ok(Json(reply))
}

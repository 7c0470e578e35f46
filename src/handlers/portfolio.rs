use axum::extract::{Path, State};
use axum::response::Json;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Position;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub user_id: Uuid,
    pub positions: Vec<Position>,
    pub total_supplied: BigDecimal,
    pub total_borrowed: BigDecimal,
    pub health_factor: BigDecimal,
    pub has_debt: bool,
    pub net_apy: f64,
}

/// GET /api/v1/portfolio/:user_id
///
/// Raw aggregation view: summed totals and the derived health factor,
/// without running the scorer or touching alerts.
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let totals = state.aggregator.aggregate(user_id).await?;
    let health_factor = state
        .health_calculator
        .calculate(&totals.total_supplied, &totals.total_borrowed)?;

    Ok(Json(PortfolioResponse {
        user_id,
        positions: totals.positions,
        total_supplied: totals.total_supplied,
        total_borrowed: totals.total_borrowed,
        health_factor: health_factor.value.clone(),
        has_debt: health_factor.has_debt,
        net_apy: totals.net_apy,
    }))
}

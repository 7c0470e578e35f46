use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PortfolioTotals;
use crate::store::PositionStore;

/// Collects a user's per-asset positions and sums their supplied and
/// borrowed totals. Pure read; a user without positions aggregates to
/// empty totals rather than an error.
pub struct PositionAggregator {
    position_store: Arc<dyn PositionStore>,
}

impl PositionAggregator {
    pub fn new(position_store: Arc<dyn PositionStore>) -> Self {
        Self { position_store }
    }

    pub async fn aggregate(&self, user_id: Uuid) -> Result<PortfolioTotals, AppError> {
        let positions = self.position_store.get_positions(user_id).await?;

        if positions.is_empty() {
            tracing::debug!(user_id = %user_id, "no positions to aggregate");
            return Ok(PortfolioTotals::empty());
        }

        let total_supplied: BigDecimal =
            positions.iter().map(|p| p.supplied_amount.clone()).sum();
        let total_borrowed: BigDecimal =
            positions.iter().map(|p| p.borrowed_amount.clone()).sum();

        let net_apy = self.net_apy(&positions, &total_supplied).await?;

        tracing::debug!(
            user_id = %user_id,
            position_count = positions.len(),
            total_supplied = %total_supplied,
            total_borrowed = %total_borrowed,
            "aggregated positions"
        );

        Ok(PortfolioTotals {
            positions,
            total_supplied,
            total_borrowed,
            net_apy,
        })
    }

    /// APY-weighted supply income minus borrow cost over total supplied.
    async fn net_apy(
        &self,
        positions: &[crate::models::Position],
        total_supplied: &BigDecimal,
    ) -> Result<f64, AppError> {
        if total_supplied.is_zero() {
            return Ok(0.0);
        }

        let assets = self.position_store.get_assets().await?;
        let rates: HashMap<Uuid, (f64, f64)> = assets
            .iter()
            .map(|a| (a.id, (a.supply_apy, a.borrow_apy)))
            .collect();

        let mut income = 0.0;
        let mut cost = 0.0;
        for position in positions {
            let (supply_apy, borrow_apy) =
                rates.get(&position.asset_id).copied().unwrap_or((0.0, 0.0));
            income += position.supplied_amount.to_f64().unwrap_or(0.0) * supply_apy;
            cost += position.borrowed_amount.to_f64().unwrap_or(0.0) * borrow_apy;
        }

        let supplied = total_supplied.to_f64().unwrap_or(0.0);
        if supplied <= 0.0 {
            return Ok(0.0);
        }
        Ok((income - cost) / supplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetMetadata, PositionDelta};
    use crate::store::InMemoryPositionStore;

    fn asset(supply_apy: f64, borrow_apy: f64) -> AssetMetadata {
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            supply_apy,
            borrow_apy,
            max_ltv: 0.75,
            liquidation_threshold: 0.80,
            liquidation_penalty: 0.05,
            price_usd: 1.0,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_empty_user_aggregates_to_zero() {
        let store = Arc::new(InMemoryPositionStore::new());
        let aggregator = PositionAggregator::new(store);

        let totals = aggregator.aggregate(Uuid::new_v4()).await.unwrap();
        assert!(totals.positions.is_empty());
        assert!(totals.total_supplied.is_zero());
        assert!(totals.total_borrowed.is_zero());
        assert_eq!(totals.net_apy, 0.0);
    }

    #[tokio::test]
    async fn test_totals_sum_across_assets() {
        let asset_a = asset(0.05, 0.07);
        let asset_b = asset(0.03, 0.04);
        let store = Arc::new(InMemoryPositionStore::with_assets(vec![
            asset_a.clone(),
            asset_b.clone(),
        ]));
        let user = Uuid::new_v4();

        store
            .upsert_position(
                user,
                asset_a.id,
                PositionDelta {
                    supplied: BigDecimal::from(600),
                    borrowed: BigDecimal::from(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .upsert_position(
                user,
                asset_b.id,
                PositionDelta {
                    supplied: BigDecimal::from(400),
                    borrowed: BigDecimal::from(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let aggregator = PositionAggregator::new(store);
        let totals = aggregator.aggregate(user).await.unwrap();

        assert_eq!(totals.positions.len(), 2);
        assert_eq!(totals.total_supplied, BigDecimal::from(1000));
        assert_eq!(totals.total_borrowed, BigDecimal::from(300));

        // (600*0.05 + 400*0.03 - 100*0.07 - 200*0.04) / 1000
        assert!((totals.net_apy - 0.027).abs() < 1e-9);
    }
}

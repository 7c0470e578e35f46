use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::AssetMetadata;

/// Per-asset market snapshot from the price/volatility feed.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub price_usd: f64,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    pub volatility: f64,
}

/// Black-box price and volatility source. The reference implementation
/// random-walks around the asset metadata so the monitoring loop has
/// moving rates to react to; a production deployment swaps in a real
/// oracle behind the same surface.
pub struct PriceFeed {
    default_volatility: f64,
    state: RwLock<HashMap<Uuid, MarketData>>,
}

impl PriceFeed {
    pub fn new(default_volatility: f64) -> Self {
        Self {
            default_volatility,
            state: RwLock::new(HashMap::new()),
        }
    }

    pub async fn market_data(&self, asset: &AssetMetadata) -> MarketData {
        let mut state = self.state.write().await;
        let current = state.entry(asset.id).or_insert_with(|| MarketData {
            price_usd: asset.price_usd,
            supply_apy: asset.supply_apy,
            borrow_apy: asset.borrow_apy,
            volatility: self.default_volatility,
        });

        // Small random walk, bounded so rates stay plausible.
        current.price_usd *= 1.0 + (rand::random::<f64>() - 0.5) * 0.01;
        current.supply_apy = (current.supply_apy + (rand::random::<f64>() - 0.5) * 0.1).max(0.0);
        current.borrow_apy = (current.borrow_apy + (rand::random::<f64>() - 0.5) * 0.1).max(0.0);
        current.volatility =
            (self.default_volatility + (rand::random::<f64>() - 0.5) * 0.05).max(0.0);

        current.clone()
    }

    /// Portfolio-wide volatility input for the scorer.
    pub async fn volatility(&self) -> f64 {
        let state = self.state.read().await;
        if state.is_empty() {
            return self.default_volatility;
        }
        state.values().map(|m| m.volatility).sum::<f64>() / state.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetMetadata {
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            supply_apy: 3.5,
            borrow_apy: 4.5,
            max_ltv: 0.75,
            liquidation_threshold: 0.80,
            liquidation_penalty: 0.05,
            price_usd: 2000.0,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_volatility_defaults_without_data() {
        let feed = PriceFeed::new(0.2);
        assert_eq!(feed.volatility().await, 0.2);
    }

    #[tokio::test]
    async fn test_market_data_stays_plausible() {
        let feed = PriceFeed::new(0.2);
        let asset = asset();
        for _ in 0..50 {
            let market = feed.market_data(&asset).await;
            assert!(market.price_usd > 0.0);
            assert!(market.supply_apy >= 0.0);
            assert!(market.borrow_apy >= 0.0);
            assert!(market.volatility >= 0.0);
        }
    }
}

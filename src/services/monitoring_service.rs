use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::config::MonitoringSettings;
use crate::error::AppError;
use crate::services::alert_engine::AlertEngine;
use crate::services::price_feed::PriceFeed;
use crate::services::risk_orchestrator::RiskOrchestrator;
use crate::store::PositionStore;

/// The monitored dimensions, each with its own polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    MarketData,
    Portfolio,
    HealthFactor,
    RiskAssessment,
}

impl MonitorKind {
    pub const ALL: [MonitorKind; 4] = [
        MonitorKind::MarketData,
        MonitorKind::Portfolio,
        MonitorKind::HealthFactor,
        MonitorKind::RiskAssessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorKind::MarketData => "market_data",
            MonitorKind::Portfolio => "portfolio",
            MonitorKind::HealthFactor => "health_factor",
            MonitorKind::RiskAssessment => "risk_assessment",
        }
    }

    pub fn interval(&self, settings: &MonitoringSettings) -> Duration {
        let seconds = match self {
            MonitorKind::MarketData => settings.market_data_interval_seconds,
            MonitorKind::Portfolio => settings.portfolio_interval_seconds,
            MonitorKind::HealthFactor => settings.health_factor_interval_seconds,
            MonitorKind::RiskAssessment => settings.risk_assessment_interval_seconds,
        };
        Duration::from_secs(seconds)
    }
}

impl FromStr for MonitorKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market_data" => Ok(MonitorKind::MarketData),
            "portfolio" => Ok(MonitorKind::Portfolio),
            "health_factor" => Ok(MonitorKind::HealthFactor),
            "risk_assessment" => Ok(MonitorKind::RiskAssessment),
            other => Err(AppError::ValidationError(format!(
                "unknown monitor kind: {}",
                other
            ))),
        }
    }
}

/// Per-user background polling. Each subscription owns one tokio task
/// keyed by (user, kind); unsubscribing aborts the task. A failed tick is
/// logged and skipped, leaving the last good snapshot in place for
/// readers.
pub struct MonitoringService {
    orchestrator: Arc<RiskOrchestrator>,
    position_store: Arc<dyn PositionStore>,
    price_feed: Arc<PriceFeed>,
    alert_engine: Arc<AlertEngine>,
    settings: MonitoringSettings,
    tasks: Mutex<HashMap<(Uuid, MonitorKind), JoinHandle<()>>>,
}

impl MonitoringService {
    pub fn new(
        orchestrator: Arc<RiskOrchestrator>,
        position_store: Arc<dyn PositionStore>,
        price_feed: Arc<PriceFeed>,
        alert_engine: Arc<AlertEngine>,
        settings: MonitoringSettings,
    ) -> Self {
        Self {
            orchestrator,
            position_store,
            price_feed,
            alert_engine,
            settings,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start polling one dimension for one user. Returns false if the
    /// subscription already existed.
    pub fn subscribe(&self, user_id: Uuid, kind: MonitorKind) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(&(user_id, kind)) {
            return false;
        }

        let handle = match kind {
            MonitorKind::MarketData => self.spawn_market_data(user_id),
            _ => self.spawn_pipeline(user_id, kind),
        };
        tasks.insert((user_id, kind), handle);

        metrics::counter!("monitor_subscriptions_total", 1, "kind" => kind.as_str());
        tracing::info!(user_id = %user_id, kind = kind.as_str(), "monitor started");
        true
    }

    /// Start every monitor kind for a user; returns the kinds newly started.
    pub fn subscribe_all(&self, user_id: Uuid) -> Vec<MonitorKind> {
        MonitorKind::ALL
            .into_iter()
            .filter(|kind| self.subscribe(user_id, *kind))
            .collect()
    }

    pub fn unsubscribe(&self, user_id: Uuid, kind: MonitorKind) -> bool {
        let removed = self.tasks.lock().unwrap().remove(&(user_id, kind));
        match removed {
            Some(handle) => {
                handle.abort();
                tracing::info!(user_id = %user_id, kind = kind.as_str(), "monitor stopped");
                true
            }
            None => false,
        }
    }

    /// Stop all monitors for a user; returns how many were running.
    pub fn unsubscribe_all(&self, user_id: Uuid) -> usize {
        MonitorKind::ALL
            .into_iter()
            .filter(|kind| self.unsubscribe(user_id, *kind))
            .count()
    }

    pub fn active_monitors(&self, user_id: Uuid) -> Vec<MonitorKind> {
        let tasks = self.tasks.lock().unwrap();
        MonitorKind::ALL
            .into_iter()
            .filter(|kind| tasks.contains_key(&(user_id, *kind)))
            .collect()
    }

    fn spawn_pipeline(&self, user_id: Uuid, kind: MonitorKind) -> JoinHandle<()> {
        let orchestrator = self.orchestrator.clone();
        let period = kind.interval(&self.settings);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = orchestrator.evaluate_user(user_id).await {
                    tracing::warn!(
                        user_id = %user_id,
                        kind = kind.as_str(),
                        error = %e,
                        "monitor tick failed, keeping previous snapshot"
                    );
                    metrics::counter!("monitor_tick_failures_total", 1, "kind" => kind.as_str());
                }
            }
        })
    }

    fn spawn_market_data(&self, user_id: Uuid) -> JoinHandle<()> {
        let position_store = self.position_store.clone();
        let price_feed = self.price_feed.clone();
        let alert_engine = self.alert_engine.clone();
        let period = MonitorKind::MarketData.interval(&self.settings);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_apy: HashMap<Uuid, f64> = HashMap::new();
            loop {
                interval.tick().await;
                let result = market_data_tick(
                    user_id,
                    position_store.as_ref(),
                    &price_feed,
                    &alert_engine,
                    &mut last_apy,
                )
                .await;
                if let Err(e) = result {
                    tracing::warn!(
                        user_id = %user_id,
                        kind = "market_data",
                        error = %e,
                        "monitor tick failed, keeping previous snapshot"
                    );
                    metrics::counter!("monitor_tick_failures_total", 1, "kind" => "market_data");
                }
            }
        })
    }
}

impl Drop for MonitoringService {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.lock() {
            for handle in tasks.values() {
                handle.abort();
            }
        }
    }
}

/// One market-data pass: refresh rates for every asset the user holds and
/// raise rate_change alerts for supply-APY moves past the threshold.
async fn market_data_tick(
    user_id: Uuid,
    position_store: &dyn PositionStore,
    price_feed: &PriceFeed,
    alert_engine: &AlertEngine,
    last_apy: &mut HashMap<Uuid, f64>,
) -> Result<(), AppError> {
    let positions = position_store.get_positions(user_id).await?;
    if positions.is_empty() {
        return Ok(());
    }

    let assets = position_store.get_assets().await?;
    for asset in assets {
        if !positions.iter().any(|p| p.asset_id == asset.id) {
            continue;
        }
        let market = price_feed.market_data(&asset).await;
        if let Some(previous) = last_apy.insert(asset.id, market.supply_apy) {
            alert_engine
                .notify_rate_change(user_id, &asset.symbol, previous, market.supply_apy)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlertSettings, RiskSettings, ScoringServiceSettings};
    use crate::models::{AssetMetadata, PositionDelta};
    use crate::services::health_factor::HealthFactorCalculator;
    use crate::services::position_aggregator::PositionAggregator;
    use crate::services::risk_scorer::RiskScorer;
    use crate::services::scoring_client::ScoringClient;
    use crate::services::snapshot_cache::SnapshotCache;
    use crate::services::AuditLog;
    use crate::store::{AlertStore, InMemoryAlertStore, InMemoryPositionStore, PositionStore};
    use bigdecimal::BigDecimal;

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

    fn service(position_store: Arc<InMemoryPositionStore>) -> MonitoringService {
        let risk_settings = RiskSettings::default();
        let alert_engine = Arc::new(AlertEngine::new(
            Arc::new(InMemoryAlertStore::new()),
            AlertSettings::default(),
        ));
        let price_feed = Arc::new(PriceFeed::new(risk_settings.default_volatility));
        let client = ScoringClient::new(&ScoringServiceSettings {
            url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 1,
        })
        .unwrap();

        let orchestrator = Arc::new(RiskOrchestrator::new(
            PositionAggregator::new(position_store.clone()),
            HealthFactorCalculator::new(risk_settings.collateral_factor).unwrap(),
            RiskScorer::new(client, &risk_settings),
            alert_engine.clone(),
            Arc::new(AuditLog::new()),
            price_feed.clone(),
            SnapshotCache::new(),
        ));

        MonitoringService::new(
            orchestrator,
            position_store,
            price_feed,
            alert_engine,
            MonitoringSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent_per_kind() {
        let service = service(Arc::new(InMemoryPositionStore::new()));
        let user = Uuid::new_v4();

        assert!(service.subscribe(user, MonitorKind::HealthFactor));
        assert!(!service.subscribe(user, MonitorKind::HealthFactor));
        assert_eq!(service.active_monitors(user), vec![MonitorKind::HealthFactor]);
    }

    #[tokio::test]
    async fn test_subscribe_all_then_unsubscribe_all() {
        let service = service(Arc::new(InMemoryPositionStore::new()));
        let user = Uuid::new_v4();

        let started = service.subscribe_all(user);
        assert_eq!(started.len(), 4);
        assert_eq!(service.active_monitors(user).len(), 4);

        assert_eq!(service.unsubscribe_all(user), 4);
        assert!(service.active_monitors(user).is_empty());
        assert!(!service.unsubscribe(user, MonitorKind::Portfolio));
    }

    #[tokio::test]
    async fn test_subscriptions_are_isolated_per_user() {
        let service = service(Arc::new(InMemoryPositionStore::new()));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        service.subscribe(a, MonitorKind::RiskAssessment);
        assert!(service.active_monitors(b).is_empty());
        assert_eq!(service.unsubscribe_all(b), 0);
        assert_eq!(service.active_monitors(a), vec![MonitorKind::RiskAssessment]);
    }

    #[tokio::test]
    async fn test_market_data_tick_alerts_on_rate_move() {
        let asset = asset();
        let store = Arc::new(InMemoryPositionStore::with_assets(vec![asset.clone()]));
        let alert_store = Arc::new(InMemoryAlertStore::new());
        // Zero threshold so any APY move raises an alert
        let alert_engine = AlertEngine::new(
            alert_store.clone(),
            AlertSettings {
                rate_change_threshold: 0.0,
                ..Default::default()
            },
        );
        let price_feed = PriceFeed::new(0.2);
        let user = Uuid::new_v4();

        store
            .upsert_position(
                user,
                asset.id,
                PositionDelta {
                    supplied: BigDecimal::from(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut last_apy = HashMap::new();
        // First pass only seeds the baseline
        market_data_tick(user, store.as_ref(), &price_feed, &alert_engine, &mut last_apy)
            .await
            .unwrap();
        assert!(alert_store.list(user, 10).await.unwrap().is_empty());

        market_data_tick(user, store.as_ref(), &price_feed, &alert_engine, &mut last_apy)
            .await
            .unwrap();
        assert_eq!(alert_store.list(user, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_monitor_kind_parses_from_str() {
        assert_eq!(
            "risk_assessment".parse::<MonitorKind>().unwrap(),
            MonitorKind::RiskAssessment
        );
        assert!("unknown".parse::<MonitorKind>().is_err());
    }
}

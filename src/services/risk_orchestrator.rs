use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AggregateStats, RiskInput};
use crate::services::alert_engine::AlertEngine;
use crate::services::audit_log::AuditLog;
use crate::services::health_factor::HealthFactorCalculator;
use crate::services::position_aggregator::PositionAggregator;
use crate::services::price_feed::PriceFeed;
use crate::services::risk_scorer::RiskScorer;
use crate::services::snapshot_cache::{RiskSnapshot, SnapshotCache};

/// Runs the full pipeline for one user: aggregate positions, derive the
/// health factor, score, evaluate alerts, record the outcome, publish the
/// snapshot. Concurrent runs for the same user are serialized on a
/// per-user lock so two overlapping ticks cannot interleave their writes.
pub struct RiskOrchestrator {
    aggregator: PositionAggregator,
    health_calculator: HealthFactorCalculator,
    scorer: RiskScorer,
    alert_engine: Arc<AlertEngine>,
    audit_log: Arc<AuditLog>,
    price_feed: Arc<PriceFeed>,
    snapshot_cache: SnapshotCache,
    user_locks: RwLock<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RiskOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aggregator: PositionAggregator,
        health_calculator: HealthFactorCalculator,
        scorer: RiskScorer,
        alert_engine: Arc<AlertEngine>,
        audit_log: Arc<AuditLog>,
        price_feed: Arc<PriceFeed>,
        snapshot_cache: SnapshotCache,
    ) -> Self {
        Self {
            aggregator,
            health_calculator,
            scorer,
            alert_engine,
            audit_log,
            price_feed,
            snapshot_cache,
            user_locks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn evaluate_user(&self, user_id: Uuid) -> Result<RiskSnapshot, AppError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let totals = self.aggregator.aggregate(user_id).await?;
        let health_factor = self
            .health_calculator
            .calculate(&totals.total_supplied, &totals.total_borrowed)?;

        let input = RiskInput {
            health_factor: health_factor.clone(),
            total_supplied: totals.total_supplied.clone(),
            total_borrowed: totals.total_borrowed.clone(),
            volatility: self.price_feed.volatility().await,
        };
        let assessment = self.scorer.assess(user_id, &input).await;

        let alerts = self
            .alert_engine
            .evaluate(user_id, &health_factor, &assessment)
            .await?;

        self.audit_log
            .append(
                user_id,
                "risk_assessment",
                json!({
                    "score": assessment.score,
                    "level": assessment.level.as_str(),
                    "source": assessment.source,
                    "health_factor": health_factor.to_f64(),
                    "has_debt": health_factor.has_debt,
                    "alerts_emitted": alerts.len(),
                }),
            )
            .await;

        let snapshot = RiskSnapshot {
            user_id,
            stats: AggregateStats {
                total_supplied: totals.total_supplied,
                total_borrowed: totals.total_borrowed,
                health_factor: health_factor.value.clone(),
                has_debt: health_factor.has_debt,
                risk_score: assessment.score,
                net_apy: totals.net_apy,
            },
            assessment,
            updated_at: Utc::now(),
        };
        self.snapshot_cache.publish(snapshot.clone()).await;

        metrics::counter!("risk_pipeline_runs_total", 1);
        tracing::info!(
            user_id = %user_id,
            score = snapshot.assessment.score,
            level = snapshot.assessment.level.as_str(),
            health_factor = snapshot.stats.health_factor.to_string(),
            "risk pipeline run complete"
        );

        Ok(snapshot)
    }

    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshot_cache
    }

    async fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        {
            let locks = self.user_locks.read().await;
            if let Some(lock) = locks.get(&user_id) {
                return lock.clone();
            }
        }
        let mut locks = self.user_locks.write().await;
        locks.entry(user_id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlertSettings, RiskSettings, ScoringServiceSettings};
    use crate::models::{AssetMetadata, PositionDelta, RiskLevel};
    use crate::services::scoring_client::ScoringClient;
    use crate::store::{AlertStore, InMemoryAlertStore, InMemoryPositionStore, PositionStore};
    use bigdecimal::BigDecimal;

    fn asset() -> AssetMetadata {
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            supply_apy: 0.04,
            borrow_apy: 0.06,
            max_ltv: 0.75,
            liquidation_threshold: 0.80,
            liquidation_penalty: 0.05,
            price_usd: 1.0,
            is_active: true,
        }
    }

    // Scoring URL points at a closed port, so every assessment exercises
    // the deterministic fallback path.
    fn orchestrator(
        position_store: Arc<InMemoryPositionStore>,
        alert_store: Arc<InMemoryAlertStore>,
    ) -> RiskOrchestrator {
        let risk_settings = RiskSettings::default();
        let scoring_settings = ScoringServiceSettings {
            url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 1,
        };
        let client = ScoringClient::new(&scoring_settings).unwrap();

        RiskOrchestrator::new(
            PositionAggregator::new(position_store),
            HealthFactorCalculator::new(risk_settings.collateral_factor).unwrap(),
            RiskScorer::new(client, &risk_settings),
            Arc::new(AlertEngine::new(alert_store, AlertSettings::default())),
            Arc::new(AuditLog::new()),
            Arc::new(PriceFeed::new(risk_settings.default_volatility)),
            SnapshotCache::new(),
        )
    }

    #[tokio::test]
    async fn test_no_positions_yields_safe_snapshot() {
        let positions = Arc::new(InMemoryPositionStore::new());
        let alerts = Arc::new(InMemoryAlertStore::new());
        let orchestrator = orchestrator(positions, alerts.clone());
        let user = Uuid::new_v4();

        let snapshot = orchestrator.evaluate_user(user).await.unwrap();
        assert_eq!(snapshot.assessment.score, 0.0);
        assert!(!snapshot.stats.has_debt);
        assert!(alerts.list(user, 10).await.unwrap().is_empty());
        assert_eq!(orchestrator.snapshots().get(user).await.unwrap().user_id, user);
    }

    #[tokio::test]
    async fn test_critical_position_alerts_and_audits() {
        let asset = asset();
        let positions = Arc::new(InMemoryPositionStore::with_assets(vec![asset.clone()]));
        let alerts = Arc::new(InMemoryAlertStore::new());
        let user = Uuid::new_v4();

        positions
            .upsert_position(
                user,
                asset.id,
                PositionDelta {
                    supplied: BigDecimal::from(1000),
                    borrowed: BigDecimal::from(900),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orchestrator = orchestrator(positions, alerts.clone());
        let snapshot = orchestrator.evaluate_user(user).await.unwrap();

        // 1000 supplied, 900 borrowed: hf = 0.8333, fallback score 100
        assert_eq!(snapshot.assessment.score, 100.0);
        assert_eq!(snapshot.assessment.level, RiskLevel::Critical);
        assert!(snapshot.stats.has_debt);
        assert_eq!(alerts.list(user, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_runs_serialize_per_user() {
        let asset = asset();
        let positions = Arc::new(InMemoryPositionStore::with_assets(vec![asset.clone()]));
        let alerts = Arc::new(InMemoryAlertStore::new());
        let user = Uuid::new_v4();

        positions
            .upsert_position(
                user,
                asset.id,
                PositionDelta {
                    supplied: BigDecimal::from(1000),
                    borrowed: BigDecimal::from(800),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orchestrator = Arc::new(orchestrator(positions, alerts.clone()));
        let a = orchestrator.clone();
        let b = orchestrator.clone();
        let (ra, rb) = tokio::join!(a.evaluate_user(user), b.evaluate_user(user));
        ra.unwrap();
        rb.unwrap();

        // Both runs complete and each emits its own alert (dedupe off)
        assert_eq!(alerts.list(user, 10).await.unwrap().len(), 2);
    }
}

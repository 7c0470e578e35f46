use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AlertSettings;
use crate::error::AppError;
use crate::models::{
    AlertEvent, AlertKind, CreateAlertEvent, HealthFactor, RiskAssessment, RiskLevel,
};
use crate::store::AlertStore;

/// Classifies a fresh assessment against the alert thresholds and writes
/// qualifying alert events to the store.
///
/// Default behavior re-notifies on every qualifying cycle, matching the
/// reference implementation. With `dedupe_enabled` only risk-level
/// transitions notify.
pub struct AlertEngine {
    alert_store: Arc<dyn AlertStore>,
    settings: AlertSettings,
    last_notified: RwLock<HashMap<Uuid, RiskLevel>>,
}

impl AlertEngine {
    pub fn new(alert_store: Arc<dyn AlertStore>, settings: AlertSettings) -> Self {
        Self {
            alert_store,
            settings,
            last_notified: RwLock::new(HashMap::new()),
        }
    }

    /// Evaluate one cycle's assessment; returns the alerts emitted (zero
    /// or one per cycle for the liquidation kind).
    pub async fn evaluate(
        &self,
        user_id: Uuid,
        health_factor: &HealthFactor,
        assessment: &RiskAssessment,
    ) -> Result<Vec<AlertEvent>, AppError> {
        if assessment.score <= self.settings.liquidation_score_threshold {
            // Condition cleared; a later re-entry should notify even with
            // dedupe on.
            self.last_notified.write().await.remove(&user_id);
            return Ok(Vec::new());
        }

        if self.settings.dedupe_enabled {
            let mut last = self.last_notified.write().await;
            if last.get(&user_id) == Some(&assessment.level) {
                tracing::debug!(
                    user_id = %user_id,
                    level = assessment.level.as_str(),
                    "suppressing repeat alert at unchanged level"
                );
                return Ok(Vec::new());
            }
            last.insert(user_id, assessment.level);
        }

        let alert = self.build_liquidation_alert(user_id, health_factor, assessment);
        self.alert_store.insert(alert.clone()).await?;

        metrics::counter!("alerts_emitted_total", 1, "kind" => "liquidation_warning");
        tracing::info!(
            user_id = %user_id,
            score = assessment.score,
            level = assessment.level.as_str(),
            "liquidation warning emitted"
        );

        Ok(vec![alert])
    }

    fn build_liquidation_alert(
        &self,
        user_id: Uuid,
        health_factor: &HealthFactor,
        assessment: &RiskAssessment,
    ) -> AlertEvent {
        let hf = health_factor.to_f64();
        let critical =
            health_factor.has_debt && hf < self.settings.critical_health_factor;

        let (title, message) = if critical {
            (
                "Critical Liquidation Risk".to_string(),
                format!(
                    "URGENT: your health factor is {:.2}. Add collateral or repay \
                     debt immediately to avoid liquidation. {}",
                    hf, assessment.recommended_action
                ),
            )
        } else {
            (
                "Liquidation Risk Alert".to_string(),
                format!(
                    "Your position has a {:.0}% risk of liquidation. {}",
                    assessment.score, assessment.recommended_action
                ),
            )
        };

        AlertEvent::new(CreateAlertEvent {
            user_id,
            kind: AlertKind::LiquidationWarning,
            title,
            message,
            payload: json!({
                "risk_score": assessment.score,
                "level": assessment.level.as_str(),
                "health_factor": hf,
                "has_debt": health_factor.has_debt,
                "source": assessment.source,
            }),
        })
    }

    /// Raised by the market-data tick when an asset's APY moves past the
    /// configured threshold. Independent of the risk score.
    pub async fn notify_rate_change(
        &self,
        user_id: Uuid,
        symbol: &str,
        previous_apy: f64,
        current_apy: f64,
    ) -> Result<Option<AlertEvent>, AppError> {
        let delta = (current_apy - previous_apy).abs();
        if delta < self.settings.rate_change_threshold {
            return Ok(None);
        }

        let direction = if current_apy > previous_apy { "up" } else { "down" };
        let alert = AlertEvent::new(CreateAlertEvent {
            user_id,
            kind: AlertKind::RateChange,
            title: format!("{} rate update", symbol),
            message: format!(
                "{} supply APY moved {} from {:.2}% to {:.2}%",
                symbol, direction, previous_apy, current_apy
            ),
            payload: json!({
                "symbol": symbol,
                "previous_apy": previous_apy,
                "current_apy": current_apy,
            }),
        });
        self.alert_store.insert(alert.clone()).await?;
        metrics::counter!("alerts_emitted_total", 1, "kind" => "rate_change");
        Ok(Some(alert))
    }

    /// Raised when a position update confirms.
    pub async fn notify_transaction_complete(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        action: &str,
    ) -> Result<AlertEvent, AppError> {
        let alert = AlertEvent::new(CreateAlertEvent {
            user_id,
            kind: AlertKind::TransactionComplete,
            title: "Transaction confirmed".to_string(),
            message: format!("Your {} transaction completed successfully", action),
            payload: json!({
                "asset_id": asset_id,
                "action": action,
            }),
        });
        self.alert_store.insert(alert.clone()).await?;
        metrics::counter!("alerts_emitted_total", 1, "kind" => "transaction_complete");
        Ok(alert)
    }
}

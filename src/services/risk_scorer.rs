use chrono::Utc;
use num_traits::ToPrimitive;
use uuid::Uuid;

use crate::config::RiskSettings;
use crate::models::{AssessmentSource, RiskAssessment, RiskInput, RiskLevel};
use crate::services::scoring_client::{PredictionInput, ScoringClient};

/// Produces a risk assessment for a borrower, preferring the remote
/// scoring service and falling back to the deterministic rule table on
/// any failure. The caller always gets an assessment; this component has
/// no error path.
pub struct RiskScorer {
    client: ScoringClient,
    ltv_surcharge_threshold: f64,
}

impl RiskScorer {
    pub fn new(client: ScoringClient, settings: &RiskSettings) -> Self {
        Self {
            client,
            ltv_surcharge_threshold: settings.ltv_surcharge_threshold,
        }
    }

    pub async fn assess(&self, user_id: Uuid, input: &RiskInput) -> RiskAssessment {
        let total_borrowed = input.total_borrowed.to_f64().unwrap_or(0.0);
        let total_supplied = input.total_supplied.to_f64().unwrap_or(0.0);

        // Zero debt never touches the network.
        if !input.health_factor.has_debt || total_borrowed == 0.0 {
            return RiskAssessment::no_debt();
        }

        let health_factor = input.health_factor.to_f64();
        let ltv = loan_to_value(total_borrowed, total_supplied);

        let prediction_input = PredictionInput {
            health_factor,
            volatility: input.volatility,
            total_borrowed,
            total_supplied,
            ltv,
        };

        match self
            .client
            .predict_liquidation_risk(user_id, prediction_input)
            .await
        {
            Ok(prediction) => {
                metrics::counter!("risk_scorer_remote_total", 1);
                RiskAssessment {
                    score: prediction.risk_score,
                    level: RiskLevel::from_score(prediction.risk_score),
                    liquidation_probability: prediction.liquidation_probability,
                    recommended_action: prediction.recommended_action,
                    time_to_liquidation_estimate: prediction.time_to_liquidation_estimate,
                    confidence_score: prediction.confidence_score,
                    source: AssessmentSource::Remote,
                    calculated_at: Utc::now(),
                }
            }
            Err(e) => {
                metrics::counter!("risk_scorer_fallback_total", 1);
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "remote scoring failed, using local fallback"
                );
                fallback_assessment(
                    health_factor,
                    total_borrowed,
                    total_supplied,
                    self.ltv_surcharge_threshold,
                )
            }
        }
    }
}

/// Percentage loan-to-value; 0 when nothing is supplied.
pub fn loan_to_value(total_borrowed: f64, total_supplied: f64) -> f64 {
    if total_supplied > 0.0 {
        (total_borrowed / total_supplied) * 100.0
    } else {
        0.0
    }
}

/// Deterministic rule-table scorer, used whenever the remote service is
/// unavailable. Pure function of its arguments; the zero-debt case is
/// handled before this is reached, so the health factor here is finite.
pub fn fallback_assessment(
    health_factor: f64,
    total_borrowed: f64,
    total_supplied: f64,
    ltv_surcharge_threshold: f64,
) -> RiskAssessment {
    if total_borrowed == 0.0 {
        return RiskAssessment::no_debt();
    }

    let (mut score, level, recommended_action, time_estimate): (f64, _, _, _) = if health_factor
        < 1.0
    {
        (
            100.0,
            RiskLevel::Critical,
            "URGENT: Add collateral or repay debt immediately",
            "< 1 hour",
        )
    } else if health_factor < 1.2 {
        (
            85.0,
            RiskLevel::Critical,
            "Add collateral immediately to avoid liquidation",
            "< 24 hours",
        )
    } else if health_factor < 1.5 {
        (
            60.0,
            RiskLevel::High,
            "Monitor position closely and consider adding collateral",
            "1-3 days",
        )
    } else if health_factor < 2.0 {
        (
            35.0,
            RiskLevel::Medium,
            "Position is safe but watch for market volatility",
            "> 1 week",
        )
    } else {
        (
            15.0,
            RiskLevel::Low,
            "Position is healthy with good safety margin",
            "> 1 month",
        )
    };

    let ltv = loan_to_value(total_borrowed, total_supplied);
    if ltv > ltv_surcharge_threshold {
        score = (score + 10.0).min(100.0);
    }

    RiskAssessment {
        score,
        level,
        liquidation_probability: score / 100.0,
        recommended_action: recommended_action.to_string(),
        time_to_liquidation_estimate: time_estimate.to_string(),
        confidence_score: 0.75,
        source: AssessmentSource::Fallback,
        calculated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LTV_THRESHOLD: f64 = 70.0;

    fn fallback(hf: f64, borrowed: f64, supplied: f64) -> RiskAssessment {
        fallback_assessment(hf, borrowed, supplied, LTV_THRESHOLD)
    }

    #[test]
    fn test_fallback_bands() {
        let cases = [
            (0.5, 100.0, RiskLevel::Critical, "< 1 hour"),
            (1.1, 85.0, RiskLevel::Critical, "< 24 hours"),
            (1.3, 60.0, RiskLevel::High, "1-3 days"),
            (1.8, 35.0, RiskLevel::Medium, "> 1 week"),
            (2.5, 15.0, RiskLevel::Low, "> 1 month"),
        ];
        for (hf, score, level, estimate) in cases {
            // 50% LTV, below the surcharge threshold
            let assessment = fallback(hf, 500.0, 1000.0);
            assert_eq!(assessment.score, score, "hf={}", hf);
            assert_eq!(assessment.level, level, "hf={}", hf);
            assert_eq!(assessment.time_to_liquidation_estimate, estimate, "hf={}", hf);
            assert_eq!(assessment.confidence_score, 0.75);
            assert_eq!(assessment.source, AssessmentSource::Fallback);
            assert_eq!(
                assessment.liquidation_probability,
                assessment.score / 100.0
            );
        }
    }

    #[test]
    fn test_band_edges_fall_into_more_severe_band() {
        // Exactly 1.0 is not < 1.0, so it lands in the < 1.2 band, etc.
        assert_eq!(fallback(1.0, 100.0, 1000.0).score, 85.0);
        assert_eq!(fallback(1.2, 100.0, 1000.0).score, 60.0);
        assert_eq!(fallback(1.5, 100.0, 1000.0).score, 35.0);
        assert_eq!(fallback(2.0, 100.0, 1000.0).score, 15.0);
    }

    #[test]
    fn test_ltv_surcharge_applies_and_caps() {
        // ltv = 80% > 70 threshold: base 15 becomes 25
        let assessment = fallback(2.5, 80.0, 100.0);
        assert_eq!(assessment.score, 25.0);

        // already 100: surcharge cannot exceed the cap
        let assessment = fallback(0.5, 80.0, 100.0);
        assert_eq!(assessment.score, 100.0);
    }

    #[test]
    fn test_ltv_surcharge_keeps_band_level() {
        // The +10 adjusts the score, not the band-derived level
        let assessment = fallback(1.8, 80.0, 100.0);
        assert_eq!(assessment.score, 45.0);
        assert_eq!(assessment.level, RiskLevel::Medium);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = fallback(1.35, 700.0, 1000.0);
        let b = fallback(1.35, 700.0, 1000.0);
        assert_eq!(a.score, b.score);
        assert_eq!(a.level, b.level);
        assert_eq!(a.time_to_liquidation_estimate, b.time_to_liquidation_estimate);
    }

    #[test]
    fn test_zero_supplied_has_no_surcharge() {
        let assessment = fallback(0.5, 100.0, 0.0);
        assert_eq!(assessment.score, 100.0);
    }

    #[test]
    fn test_heavily_leveraged_scenario() {
        // supplied=1000, borrowed=900 -> hf = 0.8333 -> critical 100,
        // ltv = 90% adds nothing past the cap
        let assessment = fallback(0.8333333333, 900.0, 1000.0);
        assert_eq!(assessment.score, 100.0);
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert_eq!(assessment.time_to_liquidation_estimate, "< 1 hour");
    }
}

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::HealthFactor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Level bands used for remote scores, matching the service contract.
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            RiskLevel::Critical
        } else if score > 60.0 {
            RiskLevel::High
        } else if score > 30.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Where an assessment came from. Consumers render `Fallback` as a
/// degraded-but-live result, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    Remote,
    Fallback,
}

/// One evaluation-cycle result. Replaced wholesale each cycle, never
/// mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub liquidation_probability: f64,
    pub recommended_action: String,
    pub time_to_liquidation_estimate: String,
    pub confidence_score: f64,
    pub source: AssessmentSource,
    pub calculated_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Fixed assessment for a borrower with no active debt.
    pub fn no_debt() -> Self {
        Self {
            score: 0.0,
            level: RiskLevel::Low,
            liquidation_probability: 0.0,
            recommended_action: "No active borrows - position is safe".to_string(),
            time_to_liquidation_estimate: "N/A".to_string(),
            confidence_score: 1.0,
            source: AssessmentSource::Fallback,
            calculated_at: Utc::now(),
        }
    }
}

/// Inputs to one scoring pass. Volatility is forwarded to the remote
/// service only; the local fallback ignores it.
#[derive(Debug, Clone)]
pub struct RiskInput {
    pub health_factor: HealthFactor,
    pub total_supplied: BigDecimal,
    pub total_borrowed: BigDecimal,
    pub volatility: f64,
}

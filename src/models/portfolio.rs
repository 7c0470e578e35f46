use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Solvency ratio of a borrower.
///
/// A position with no debt has an infinite health factor; that sentinel is
/// carried as `value = 0` with `has_debt = false` so a literal infinity
/// never crosses a JSON boundary. Callers must check `has_debt` before
/// interpreting the numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthFactor {
    pub value: BigDecimal,
    pub has_debt: bool,
}

impl HealthFactor {
    pub fn no_debt() -> Self {
        Self {
            value: BigDecimal::zero(),
            has_debt: false,
        }
    }

    pub fn of(value: BigDecimal) -> Self {
        Self {
            value,
            has_debt: true,
        }
    }

    /// Below 1.0 the position is eligible for liquidation.
    pub fn is_liquidatable(&self) -> bool {
        self.has_debt && self.value < BigDecimal::from(1)
    }

    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or(0.0)
    }
}

/// Per-user aggregate recomputed from the full position set on demand;
/// never the authoritative copy of anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_supplied: BigDecimal,
    pub total_borrowed: BigDecimal,
    pub health_factor: BigDecimal,
    pub has_debt: bool,
    pub risk_score: f64,
    pub net_apy: f64,
}

/// Output of the position aggregator: the raw position list plus summed
/// totals, before any risk derivation.
#[derive(Debug, Clone)]
pub struct PortfolioTotals {
    pub positions: Vec<Position>,
    pub total_supplied: BigDecimal,
    pub total_borrowed: BigDecimal,
    pub net_apy: f64,
}

impl PortfolioTotals {
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            total_supplied: BigDecimal::zero(),
            total_borrowed: BigDecimal::zero(),
            net_apy: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_no_debt_sentinel() {
        let hf = HealthFactor::no_debt();
        assert!(!hf.has_debt);
        assert_eq!(hf.value, BigDecimal::zero());
        assert!(!hf.is_liquidatable());
    }

    #[test]
    fn test_liquidatable_below_one() {
        let hf = HealthFactor::of(BigDecimal::from_str("0.99").unwrap());
        assert!(hf.is_liquidatable());

        let hf = HealthFactor::of(BigDecimal::from(1));
        assert!(!hf.is_liquidatable());
    }

    #[test]
    fn test_sentinel_serializes_without_infinity() {
        let json = serde_json::to_string(&HealthFactor::no_debt()).unwrap();
        assert!(json.contains("\"has_debt\":false"));
        assert!(!json.contains("inf"));
    }
}

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::error::AppError;
use crate::models::HealthFactor;

/// Converts aggregated supply/borrow totals into a single solvency ratio.
///
/// `health_factor = (total_supplied × collateral_factor) / total_borrowed`
/// with full decimal precision; rounding belongs to the presentation
/// layer, never to this computation.
pub struct HealthFactorCalculator {
    collateral_factor: BigDecimal,
}

impl HealthFactorCalculator {
    pub fn new(collateral_factor: f64) -> Result<Self, AppError> {
        let collateral_factor = BigDecimal::try_from(collateral_factor).map_err(|e| {
            AppError::ConfigError(format!("invalid collateral factor: {}", e))
        })?;
        if collateral_factor <= BigDecimal::zero() {
            return Err(AppError::ConfigError(
                "collateral factor must be positive".to_string(),
            ));
        }
        Ok(Self { collateral_factor })
    }

    pub fn calculate(
        &self,
        total_supplied: &BigDecimal,
        total_borrowed: &BigDecimal,
    ) -> Result<HealthFactor, AppError> {
        if total_supplied < &BigDecimal::zero() || total_borrowed < &BigDecimal::zero() {
            return Err(AppError::ValidationError(format!(
                "negative totals: supplied={}, borrowed={}",
                total_supplied, total_borrowed
            )));
        }

        if total_borrowed.is_zero() {
            return Ok(HealthFactor::no_debt());
        }

        let ratio = (total_supplied * &self.collateral_factor) / total_borrowed;
        Ok(HealthFactor::of(ratio))
    }
}

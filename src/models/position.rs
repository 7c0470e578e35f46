use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A user's per-asset lending position. One row per (user, asset); created
/// on first interaction and zeroed rather than deleted so history survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub supplied_amount: BigDecimal,
    pub borrowed_amount: BigDecimal,
    pub collateral_amount: BigDecimal,
    pub interest_accrued: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signed deltas applied by supply/borrow/repay/withdraw flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionDelta {
    #[serde(default)]
    pub supplied: BigDecimal,
    #[serde(default)]
    pub borrowed: BigDecimal,
    #[serde(default)]
    pub collateral: BigDecimal,
    #[serde(default)]
    pub interest: BigDecimal,
}

impl Position {
    pub fn new(user_id: Uuid, asset_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            asset_id,
            supplied_amount: BigDecimal::zero(),
            borrowed_amount: BigDecimal::zero(),
            collateral_amount: BigDecimal::zero(),
            interest_accrued: BigDecimal::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a signed delta, rejecting any result that would break the
    /// non-negativity or collateral invariants.
    pub fn apply_delta(&mut self, delta: &PositionDelta) -> Result<(), AppError> {
        let supplied = &self.supplied_amount + &delta.supplied;
        let borrowed = &self.borrowed_amount + &delta.borrowed;
        let collateral = &self.collateral_amount + &delta.collateral;
        let interest = &self.interest_accrued + &delta.interest;

        if supplied < BigDecimal::zero()
            || borrowed < BigDecimal::zero()
            || collateral < BigDecimal::zero()
            || interest < BigDecimal::zero()
        {
            return Err(AppError::ValidationError(format!(
                "position {} delta would produce a negative amount",
                self.id
            )));
        }
        if collateral > supplied {
            return Err(AppError::ValidationError(format!(
                "position {} collateral {} would exceed supplied {}",
                self.id, collateral, supplied
            )));
        }

        self.supplied_amount = supplied;
        self.borrowed_amount = borrowed;
        self.collateral_amount = collateral;
        self.interest_accrued = interest;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// True once every balance is back to zero. The record is kept anyway.
    pub fn is_zeroed(&self) -> bool {
        self.supplied_amount.is_zero()
            && self.borrowed_amount.is_zero()
            && self.collateral_amount.is_zero()
    }
}

/// Market metadata for a supported asset. The per-asset liquidation
/// threshold is informational; the health factor uses the global
/// collateral factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    pub max_ltv: f64,
    pub liquidation_threshold: f64,
    pub liquidation_penalty: f64,
    pub price_usd: f64,
    pub is_active: bool,
}

pub mod memory;

pub use memory::*;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertEvent, AssetMetadata, Position, PositionDelta};

/// Keyed store of per-(user, asset) positions. Persistence is an external
/// collaborator; the in-memory implementation in [`memory`] is the
/// reference.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// All positions for a user, historical zeroed ones included. A user
    /// with no positions yields an empty list, not an error.
    async fn get_positions(&self, user_id: Uuid) -> Result<Vec<Position>, AppError>;

    /// Apply a signed delta, creating the position on first interaction.
    async fn upsert_position(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        delta: PositionDelta,
    ) -> Result<Position, AppError>;

    async fn get_assets(&self) -> Result<Vec<AssetMetadata>, AppError>;
}

/// Append-only alert store; `read` flags are the only mutation.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(&self, alert: AlertEvent) -> Result<(), AppError>;

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError>;

    /// Marks every alert of one user read, returning how many changed.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Newest-first listing for one user.
    async fn list(&self, user_id: Uuid, limit: usize) -> Result<Vec<AlertEvent>, AppError>;
}

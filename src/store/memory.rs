use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertEvent, AssetMetadata, Position, PositionDelta};
use crate::store::{AlertStore, PositionStore};

/// In-memory position store keyed by (user, asset), which enforces the
/// one-position-per-pair uniqueness by construction.
pub struct InMemoryPositionStore {
    positions: RwLock<HashMap<(Uuid, Uuid), Position>>,
    assets: RwLock<Vec<AssetMetadata>>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            assets: RwLock::new(Vec::new()),
        }
    }

    pub fn with_assets(assets: Vec<AssetMetadata>) -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            assets: RwLock::new(assets),
        }
    }

    pub async fn set_assets(&self, assets: Vec<AssetMetadata>) {
        *self.assets.write().await = assets;
    }
}

impl Default for InMemoryPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn get_positions(&self, user_id: Uuid) -> Result<Vec<Position>, AppError> {
        let positions = self.positions.read().await;
        let mut result: Vec<Position> = positions
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|p| p.created_at);
        Ok(result)
    }

    async fn upsert_position(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        delta: PositionDelta,
    ) -> Result<Position, AppError> {
        let mut positions = self.positions.write().await;
        let entry = positions
            .entry((user_id, asset_id))
            .or_insert_with(|| Position::new(user_id, asset_id));

        // apply_delta validates before mutating, so a rejected delta
        // leaves the stored position intact.
        entry.apply_delta(&delta)?;
        Ok(entry.clone())
    }

    async fn get_assets(&self) -> Result<Vec<AssetMetadata>, AppError> {
        Ok(self.assets.read().await.clone())
    }
}

pub struct InMemoryAlertStore {
    alerts: RwLock<Vec<AlertEvent>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert(&self, alert: AlertEvent) -> Result<(), AppError> {
        self.alerts.write().await.push(alert);
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.read = true;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("alert {} not found", id))),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut alerts = self.alerts.write().await;
        let mut changed = 0u64;
        for alert in alerts.iter_mut().filter(|a| a.user_id == user_id && !a.read) {
            alert.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn list(&self, user_id: Uuid, limit: usize) -> Result<Vec<AlertEvent>, AppError> {
        let alerts = self.alerts.read().await;
        let mut result: Vec<AlertEvent> = alerts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, CreateAlertEvent};
    use bigdecimal::BigDecimal;
    use serde_json::json;

    fn supply(amount: i64) -> PositionDelta {
        PositionDelta {
            supplied: BigDecimal::from(amount),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_positions_are_empty_not_error() {
        let store = InMemoryPositionStore::new();
        let positions = store.get_positions(Uuid::new_v4()).await.unwrap();
        assert!(positions.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_single_row() {
        let store = InMemoryPositionStore::new();
        let user = Uuid::new_v4();
        let asset = Uuid::new_v4();

        store.upsert_position(user, asset, supply(100)).await.unwrap();
        store.upsert_position(user, asset, supply(50)).await.unwrap();

        let positions = store.get_positions(user).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].supplied_amount, BigDecimal::from(150));
    }

    #[tokio::test]
    async fn test_zeroed_position_survives() {
        let store = InMemoryPositionStore::new();
        let user = Uuid::new_v4();
        let asset = Uuid::new_v4();

        store.upsert_position(user, asset, supply(100)).await.unwrap();
        store.upsert_position(user, asset, supply(-100)).await.unwrap();

        let positions = store.get_positions(user).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_zeroed());
    }

    fn make_alert(user_id: Uuid) -> AlertEvent {
        AlertEvent::new(CreateAlertEvent {
            user_id,
            kind: AlertKind::LiquidationWarning,
            title: "t".to_string(),
            message: "m".to_string(),
            payload: json!({}),
        })
    }

    #[tokio::test]
    async fn test_mark_read_and_mark_all_read() {
        let store = InMemoryAlertStore::new();
        let user = Uuid::new_v4();

        let first = make_alert(user);
        let first_id = first.id;
        store.insert(first).await.unwrap();
        store.insert(make_alert(user)).await.unwrap();
        store.insert(make_alert(Uuid::new_v4())).await.unwrap();

        store.mark_read(first_id).await.unwrap();
        let remaining = store.mark_all_read(user).await.unwrap();
        assert_eq!(remaining, 1);

        let listed = store.list(user, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|a| a.read));
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id() {
        let store = InMemoryAlertStore::new();
        let result = store.mark_read(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let store = InMemoryAlertStore::new();
        let user = Uuid::new_v4();
        for _ in 0..5 {
            store.insert(make_alert(user)).await.unwrap();
        }

        let listed = store.list(user, 3).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}

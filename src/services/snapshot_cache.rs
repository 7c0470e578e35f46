use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AggregateStats, RiskAssessment};

/// Complete result of one pipeline run for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub user_id: Uuid,
    pub stats: AggregateStats,
    pub assessment: RiskAssessment,
    pub updated_at: DateTime<Utc>,
}

/// Keyed cache of the latest snapshot per user. Written only by the
/// pipeline, and always as one complete snapshot, so readers never see an
/// assessment computed from stale totals. Consumers hold read access only.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<RwLock<HashMap<Uuid, RiskSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn publish(&self, snapshot: RiskSnapshot) {
        self.inner.write().await.insert(snapshot.user_id, snapshot);
    }

    pub async fn get(&self, user_id: Uuid) -> Option<RiskSnapshot> {
        self.inner.read().await.get(&user_id).cloned()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskAssessment;
    use bigdecimal::BigDecimal;

    fn snapshot(user_id: Uuid, score: f64) -> RiskSnapshot {
        let assessment = RiskAssessment {
            score,
            ..RiskAssessment::no_debt()
        };
        RiskSnapshot {
            user_id,
            stats: AggregateStats {
                total_supplied: BigDecimal::from(1000),
                total_borrowed: BigDecimal::from(0),
                health_factor: BigDecimal::from(0),
                has_debt: false,
                risk_score: score,
                net_apy: 0.0,
            },
            assessment,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_replaces_whole_snapshot() {
        let cache = SnapshotCache::new();
        let user = Uuid::new_v4();

        cache.publish(snapshot(user, 10.0)).await;
        cache.publish(snapshot(user, 20.0)).await;

        let latest = cache.get(user).await.unwrap();
        assert_eq!(latest.assessment.score, 20.0);
        assert_eq!(latest.stats.risk_score, 20.0);
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let cache = SnapshotCache::new();
        assert!(cache.get(Uuid::new_v4()).await.is_none());
    }
}

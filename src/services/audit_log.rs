use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One append-only record with a proof hash over its content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub proof_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Append/verify log of scoring and advisory outcomes. Each record
/// carries a SHA-256 over (user, kind, payload) so a stored record can be
/// checked for tampering later.
pub struct AuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn append(
        &self,
        user_id: Uuid,
        kind: &str,
        payload: serde_json::Value,
    ) -> AuditRecord {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            user_id,
            kind: kind.to_string(),
            proof_hash: Self::proof_hash(user_id, kind, &payload),
            payload,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        record
    }

    /// Recomputes the hash and compares it with the stored one.
    pub fn verify(record: &AuditRecord) -> bool {
        Self::proof_hash(record.user_id, &record.kind, &record.payload) == record.proof_hash
    }

    pub async fn list(&self, user_id: Uuid) -> Vec<AuditRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    fn proof_hash(user_id: Uuid, kind: &str, payload: &serde_json::Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(kind.as_bytes());
        hasher.update(payload.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

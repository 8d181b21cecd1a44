//! Consent Manager
//!
//! 目的別の同意記録ストア

use super::types::ConsentRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 同意記録ストア
///
/// 記録のない `(user_id, purpose)` は未同意として扱う（default-deny）。
#[async_trait]
pub trait ConsentStore: Send + Sync + std::fmt::Debug {
    /// 同意記録を取得
    async fn get(&self, user_id: &str, purpose: &str) -> Result<Option<ConsentRecord>>;

    /// 同意記録を上書き保存
    async fn update(
        &self,
        user_id: &str,
        purpose: &str,
        granted: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<ConsentRecord>;

    /// ユーザーの全同意記録を削除（冪等）
    async fn remove(&self, user_id: &str) -> Result<usize>;

    /// ユーザーの全同意記録を取得
    async fn list(&self, user_id: &str) -> Result<Vec<ConsentRecord>>;

    /// 同意記録を持つユーザー数
    async fn count(&self) -> Result<usize>;

    /// 同意状態を確認
    async fn check(&self, user_id: &str, purpose: &str) -> Result<bool> {
        Ok(self
            .get(user_id, purpose)
            .await?
            .map(|record| record.granted)
            .unwrap_or(false))
    }
}

/// インメモリ同意ストア
#[derive(Debug)]
pub struct MemoryConsentStore {
    /// user_id -> (purpose -> 同意記録)
    consents: Arc<RwLock<HashMap<String, HashMap<String, ConsentRecord>>>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self {
            consents: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryConsentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    async fn get(&self, user_id: &str, purpose: &str) -> Result<Option<ConsentRecord>> {
        let consents = self.consents.read().await;
        Ok(consents
            .get(user_id)
            .and_then(|by_purpose| by_purpose.get(purpose))
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        purpose: &str,
        granted: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<ConsentRecord> {
        let record = ConsentRecord::new(user_id, purpose, granted, updated_at);

        let mut consents = self.consents.write().await;
        consents
            .entry(user_id.to_string())
            .or_default()
            .insert(purpose.to_string(), record.clone());

        debug!(user_id, purpose, granted, "consent record upserted");
        Ok(record)
    }

    async fn remove(&self, user_id: &str) -> Result<usize> {
        let mut consents = self.consents.write().await;
        Ok(consents
            .remove(user_id)
            .map(|by_purpose| by_purpose.len())
            .unwrap_or(0))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ConsentRecord>> {
        let consents = self.consents.read().await;
        let mut records: Vec<ConsentRecord> = consents
            .get(user_id)
            .map(|by_purpose| by_purpose.values().cloned().collect())
            .unwrap_or_default();

        // 目的名順で安定化
        records.sort_by(|a, b| a.purpose.cmp(&b.purpose));
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        let consents = self.consents.read().await;
        Ok(consents.len())
    }
}

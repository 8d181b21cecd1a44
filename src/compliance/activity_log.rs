//! Activity Log
//!
//! 追記専用のデータ処理記録

use super::types::{ActivityRecord, RetentionWindow};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// データ処理記録ストア
///
/// 記録は挿入順で返される。
#[async_trait]
pub trait ActivityLog: Send + Sync + std::fmt::Debug {
    /// 新しい記録を追加して返す
    async fn append(
        &self,
        user_id: &str,
        activity_type: &str,
        payload: Value,
        consent_given: bool,
    ) -> Result<ActivityRecord>;

    /// ユーザー・処理種別で絞り込んだ記録
    async fn query_by_type(
        &self,
        user_id: Option<&str>,
        activity_type: Option<&str>,
    ) -> Result<Vec<ActivityRecord>>;

    /// ユーザーの全記録を削除（冪等）
    async fn remove(&self, user_id: &str) -> Result<usize>;

    /// 保持期限切れの記録を削除
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// 記録数
    async fn len(&self) -> Result<usize>;

    /// 追加時に適用する保持期間
    fn retention(&self) -> RetentionWindow;

    /// 記録が空か
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// ユーザーで絞り込んだ記録（None なら全件）
    async fn query(&self, user_id: Option<&str>) -> Result<Vec<ActivityRecord>> {
        self.query_by_type(user_id, None).await
    }

    /// 出現順の処理種別一覧
    async fn activity_types(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut types: Vec<String> = Vec::new();
        for record in self.query(None).await? {
            if seen.insert(record.activity_type.clone()) {
                types.push(record.activity_type);
            }
        }
        Ok(types)
    }
}

/// インメモリ処理記録ストア
#[derive(Debug)]
pub struct MemoryActivityLog {
    records: Arc<RwLock<Vec<ActivityRecord>>>,
    retention: RetentionWindow,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::with_retention(RetentionWindow::default())
    }

    pub fn with_retention(retention: RetentionWindow) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            retention,
        }
    }
}

impl Default for MemoryActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn append(
        &self,
        user_id: &str,
        activity_type: &str,
        payload: Value,
        consent_given: bool,
    ) -> Result<ActivityRecord> {
        let record =
            ActivityRecord::new(user_id, activity_type, payload, consent_given, self.retention);

        let mut records = self.records.write().await;
        records.push(record.clone());

        debug!(
            id = %record.id,
            user_id,
            activity_type,
            consent_given,
            "activity appended"
        );
        Ok(record)
    }

    async fn query_by_type(
        &self,
        user_id: Option<&str>,
        activity_type: Option<&str>,
    ) -> Result<Vec<ActivityRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| activity_type.map_or(true, |t| r.activity_type == t))
            .cloned()
            .collect())
    }

    async fn remove(&self, user_id: &str) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.user_id != user_id);
        Ok(before - records.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.is_expired(now));
        let purged = before - records.len();

        if purged > 0 {
            info!(purged, "expired activity records purged");
        }
        Ok(purged)
    }

    async fn len(&self) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records.len())
    }

    fn retention(&self) -> RetentionWindow {
        self.retention
    }
}

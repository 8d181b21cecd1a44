//! Data Vault
//!
//! データ主体の個人データ記録ストア

use super::types::{DataSource, PersonalDataRecord, TIMESTAMP_FORMAT};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// プレースホルダーの電話番号
pub const PLACEHOLDER_PHONE: &str = "1234567890";
/// プレースホルダーの住所
pub const PLACEHOLDER_ADDRESS: &str = "123 Privacy Street";

/// 個人データ取得結果
#[derive(Debug, Clone, PartialEq)]
pub struct VaultLookup {
    pub record: PersonalDataRecord,
    pub source: DataSource,
}

impl VaultLookup {
    pub fn is_placeholder(&self) -> bool {
        self.source == DataSource::Placeholder
    }
}

/// 個人データストア
#[async_trait]
pub trait DataVault: Send + Sync + std::fmt::Debug {
    /// 保存済みの記録を取得
    async fn load(&self, user_id: &str) -> Result<Option<PersonalDataRecord>>;

    /// 記録を丸ごと上書き保存
    async fn put(&self, record: PersonalDataRecord) -> Result<()>;

    /// 記録を削除（冪等）
    async fn remove(&self, user_id: &str) -> Result<bool>;

    /// 保存済みユーザー数
    async fn count(&self) -> Result<usize>;

    /// 記録を取得。未登録ならプレースホルダーを合成する
    async fn get(&self, user_id: &str) -> Result<VaultLookup> {
        Ok(match self.load(user_id).await? {
            Some(record) => VaultLookup {
                record,
                source: DataSource::Stored,
            },
            None => VaultLookup {
                record: placeholder_record(user_id),
                source: DataSource::Placeholder,
            },
        })
    }
}

/// 未登録ユーザー向けのプレースホルダー記録
pub fn placeholder_record(user_id: &str) -> PersonalDataRecord {
    PersonalDataRecord::new(user_id)
        .with_field("email", format!("{}@example.com", user_id))
        .with_field("phone", PLACEHOLDER_PHONE)
        .with_field("address", PLACEHOLDER_ADDRESS)
        .with_field(
            "created_at",
            Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        )
}

/// インメモリ個人データストア
#[derive(Debug)]
pub struct MemoryDataVault {
    records: Arc<RwLock<HashMap<String, PersonalDataRecord>>>,
}

impl MemoryDataVault {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryDataVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataVault for MemoryDataVault {
    async fn load(&self, user_id: &str) -> Result<Option<PersonalDataRecord>> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }

    async fn put(&self, record: PersonalDataRecord) -> Result<()> {
        let mut records = self.records.write().await;
        debug!(user_id = %record.user_id, fields = record.fields.len(), "personal data stored");
        records.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(user_id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_for_unknown_user() {
        let vault = MemoryDataVault::new();
        let lookup = vault.get("user123").await.unwrap();

        assert!(lookup.is_placeholder());
        assert_eq!(lookup.record.user_id, "user123");
        assert_eq!(lookup.record.get_str("email"), Some("user123@example.com"));
        assert_eq!(lookup.record.get_str("phone"), Some(PLACEHOLDER_PHONE));
        assert_eq!(lookup.record.get_str("address"), Some(PLACEHOLDER_ADDRESS));
        assert!(lookup.record.get("created_at").is_some());

        // プレースホルダーは保存されない
        assert_eq!(vault.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_overwrites_wholesale() {
        let vault = MemoryDataVault::new();
        vault
            .put(
                PersonalDataRecord::new("user123")
                    .with_field("email", "a@b.com")
                    .with_field("phone", "555"),
            )
            .await
            .unwrap();
        vault
            .put(PersonalDataRecord::new("user123").with_field("email", "c@d.com"))
            .await
            .unwrap();

        let lookup = vault.get("user123").await.unwrap();
        assert_eq!(lookup.source, DataSource::Stored);
        assert_eq!(lookup.record.get_str("email"), Some("c@d.com"));
        assert!(lookup.record.get("phone").is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let vault = MemoryDataVault::new();
        vault
            .put(PersonalDataRecord::new("user123").with_field("email", "a@b.com"))
            .await
            .unwrap();

        assert!(vault.remove("user123").await.unwrap());
        assert!(!vault.remove("user123").await.unwrap());
        assert!(vault.get("user123").await.unwrap().is_placeholder());
    }
}

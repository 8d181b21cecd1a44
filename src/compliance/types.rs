//! Compliance Types
//!
//! 同意・処理記録・個人データ・応答に関する型定義

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// フィールド名 -> 値 のマップ
pub type FieldMap = BTreeMap<String, Value>;

/// 法令上の最小保持期間（日数）
pub const MIN_RETENTION_DAYS: u32 = 730;

/// 表示用タイムスタンプ形式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 同意記録
///
/// `(user_id, purpose)` ごとに一意。後勝ちで上書きされ、履歴は保持しない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsentRecord {
    /// データ主体の識別子
    pub user_id: String,
    /// 同意目的
    pub purpose: String,
    /// 同意の有無
    pub granted: bool,
    /// 最終更新日時
    pub updated_at: DateTime<Utc>,
}

impl ConsentRecord {
    /// 新しい同意記録を作成
    pub fn new(
        user_id: impl Into<String>,
        purpose: impl Into<String>,
        granted: bool,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            purpose: purpose.into(),
            granted,
            updated_at,
        }
    }
}

/// 保持期間
///
/// 730日未満は構築できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RetentionWindow {
    days: u32,
}

impl RetentionWindow {
    /// 保持期間を作成（730日未満はエラー）
    pub fn new(days: u32) -> Result<Self> {
        if days < MIN_RETENTION_DAYS {
            return Err(Error::Config(format!(
                "retention window of {} days is below the {} day minimum",
                days, MIN_RETENTION_DAYS
            )));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// 作成日時から保持期限を計算
    pub fn horizon_from(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(i64::from(self.days))
    }

    /// "2 years" / "800 days" 形式の説明
    pub fn describe(&self) -> String {
        if self.days % 365 == 0 {
            let years = self.days / 365;
            if years == 1 {
                "1 year".to_string()
            } else {
                format!("{} years", years)
            }
        } else {
            format!("{} days", self.days)
        }
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self {
            days: MIN_RETENTION_DAYS,
        }
    }
}

impl TryFrom<u32> for RetentionWindow {
    type Error = Error;

    fn try_from(days: u32) -> Result<Self> {
        Self::new(days)
    }
}

impl From<RetentionWindow> for u32 {
    fn from(window: RetentionWindow) -> Self {
        window.days
    }
}

/// データ処理記録
///
/// 作成後は不変。削除は消去要求によってのみ行われる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    /// 記録ID
    pub id: String,
    /// データ主体の識別子
    pub user_id: String,
    /// 処理種別
    pub activity_type: String,
    /// 処理日時
    pub timestamp: DateTime<Utc>,
    /// 実際に処理したデータ
    pub payload: Value,
    /// 処理時点の同意状態
    pub consent_given: bool,
    /// 保持期限
    pub retention_until: DateTime<Utc>,
}

impl ActivityRecord {
    /// 現在時刻で新しい処理記録を作成
    pub fn new(
        user_id: impl Into<String>,
        activity_type: impl Into<String>,
        payload: Value,
        consent_given: bool,
        retention: RetentionWindow,
    ) -> Self {
        Self::at(
            user_id,
            activity_type,
            payload,
            consent_given,
            retention,
            Utc::now(),
        )
    }

    /// 指定時刻で処理記録を作成
    pub fn at(
        user_id: impl Into<String>,
        activity_type: impl Into<String>,
        payload: Value,
        consent_given: bool,
        retention: RetentionWindow,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            activity_type: activity_type.into(),
            timestamp,
            payload,
            consent_given,
            retention_until: retention.horizon_from(timestamp),
        }
    }

    /// 保持期限を過ぎているか
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.retention_until < now
    }
}

/// 個人データ記録
///
/// ユーザーごとに1件。保存時は丸ごと上書きされる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonalDataRecord {
    /// データ主体の識別子
    pub user_id: String,
    /// 任意の名前付きフィールド（email, phone, address 等）
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl PersonalDataRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            fields: FieldMap::new(),
        }
    }

    /// フィールドを追加（ビルダー形式）
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// 個人データの出所
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// 保存済みデータ
    Stored,
    /// 未登録ユーザー向けに合成されたデータ
    Placeholder,
}

/// データアクセス要求の応答データ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessPayload {
    /// 匿名化済みの個人データ
    #[serde(flatten)]
    pub record: PersonalDataRecord,
    /// データの出所
    pub data_source: DataSource,
}

/// 応答ステータス
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// 呼び出し側に返す構造化応答
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceResponse<T> {
    /// 処理ステータス
    pub status: ResponseStatus,
    /// 応答データ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// メッセージ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 応答日時
    pub timestamp: DateTime<Utc>,
}

impl<T> ComplianceResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// 消去要求の結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErasureSummary {
    /// 削除した処理記録数
    pub activities_removed: usize,
    /// 削除した同意記録数
    pub consents_removed: usize,
    /// 個人データ記録を削除したか
    pub personal_data_removed: bool,
}

/// 最小化の結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MinimizationOutcome {
    /// 目的が許可されているか
    pub is_valid: bool,
    /// 目的に必要なフィールドのみ
    pub minimized_fields: FieldMap,
    /// 除外された（空でない）フィールド
    pub excluded_fields: FieldMap,
}

/// エンジン統計
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// 処理記録数
    pub activity_logs: usize,
    /// 同意記録のあるユーザー数
    pub consent_records: usize,
    /// 個人データ登録済みユーザー数
    pub registered_users: usize,
}

/// 値が空か（null, 空文字列, 空配列, 空オブジェクト）
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retention_window_minimum() {
        assert!(RetentionWindow::new(729).is_err());
        let window = RetentionWindow::new(730).unwrap();
        assert_eq!(window.days(), 730);
        assert_eq!(window.describe(), "2 years");
        assert_eq!(RetentionWindow::new(800).unwrap().describe(), "800 days");
    }

    #[test]
    fn test_activity_record_retention() {
        let now = Utc::now();
        let record = ActivityRecord::at(
            "user123",
            "authentication",
            json!({"username": "jdoe"}),
            true,
            RetentionWindow::default(),
            now,
        );

        assert_eq!(record.retention_until, now + Duration::days(730));
        assert!(!record.is_expired(now));
        assert!(record.is_expired(now + Duration::days(731)));
    }

    #[test]
    fn test_personal_data_record_serializes_flat() {
        let record = PersonalDataRecord::new("user123").with_field("email", "a@b.com");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["user_id"], "user123");
        assert_eq!(value["email"], "a@b.com");

        let back: PersonalDataRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_response_status_serialization() {
        let response: ComplianceResponse<()> = ComplianceResponse::error("boom");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "boom");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }
}

//! Compliance Engine
//!
//! 同意ストア・処理記録・個人データ・最小化ルールを束ねるメインエンジン

use super::activity_log::{ActivityLog, MemoryActivityLog};
use super::anonymizer::{sha256_hex, Anonymizer};
use super::consent_manager::{ConsentStore, MemoryConsentStore};
use super::data_vault::{DataVault, MemoryDataVault};
use super::export::activities_to_csv;
use super::minimization::MinimizationPolicy;
use super::policy::ProtectionPolicy;
use super::subject_lock::SubjectLocks;
use super::types::*;
use crate::config::EngineConfig;
use crate::error::{ensure_user_id, Error, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// データアクセス要求失敗時の利用者向けメッセージ
pub const ACCESS_ERROR_MESSAGE: &str = "Unable to process data access request";
/// 消去成功時のメッセージ
pub const ERASURE_SUCCESS_MESSAGE: &str = "User data successfully erased";

/// データアクセス要求の処理種別
pub const ACTIVITY_DATA_ACCESS: &str = "data_access_request";
/// 消去要求の処理種別
pub const ACTIVITY_ERASURE: &str = "right_to_be_forgotten";
/// 個人データ保存の処理種別
pub const ACTIVITY_DATA_STORED: &str = "personal_data_stored";

/// コンプライアンスエンジン
///
/// ストアは構築時に注入される。複数ストアにまたがる操作は user_id 単位で直列化される。
#[derive(Debug)]
pub struct ComplianceEngine {
    /// 同意ストア
    consents: Arc<dyn ConsentStore>,
    /// 処理記録
    activities: Arc<dyn ActivityLog>,
    /// 個人データ
    vault: Arc<dyn DataVault>,
    minimization: MinimizationPolicy,
    anonymizer: Anonymizer,
    config: EngineConfig,
    locks: SubjectLocks,
}

impl ComplianceEngine {
    /// デフォルト設定・インメモリストアでエンジンを作成
    pub fn new() -> Self {
        Self::in_memory(EngineConfig::default(), RetentionWindow::default())
    }

    /// 設定からインメモリストアのエンジンを作成
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let retention = config.retention()?;
        Ok(Self::in_memory(config, retention))
    }

    /// 任意のストアを注入してエンジンを作成
    ///
    /// 設定の保持期間は処理記録ストアの保持期間と一致していなければならない。
    pub fn with_stores(
        config: EngineConfig,
        consents: Arc<dyn ConsentStore>,
        activities: Arc<dyn ActivityLog>,
        vault: Arc<dyn DataVault>,
    ) -> Result<Self> {
        config.validate()?;

        let configured = config.retention()?;
        let applied = activities.retention();
        if configured != applied {
            return Err(Error::Config(format!(
                "retention_days is {} but the activity log retains records for {} days",
                configured.days(),
                applied.days()
            )));
        }

        Ok(Self {
            consents,
            activities,
            vault,
            minimization: MinimizationPolicy::new(),
            anonymizer: Anonymizer::new(),
            config,
            locks: SubjectLocks::new(),
        })
    }

    fn in_memory(config: EngineConfig, retention: RetentionWindow) -> Self {
        Self {
            consents: Arc::new(MemoryConsentStore::new()),
            activities: Arc::new(MemoryActivityLog::with_retention(retention)),
            vault: Arc::new(MemoryDataVault::new()),
            minimization: MinimizationPolicy::new(),
            anonymizer: Anonymizer::new(),
            config,
            locks: SubjectLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn minimization(&self) -> &MinimizationPolicy {
        &self.minimization
    }

    /// 同意状態を確認（記録なし・ストア障害時は false）
    #[instrument(skip(self))]
    pub async fn check_consent(&self, user_id: &str, purpose: &str) -> bool {
        if ensure_user_id(user_id).is_err() {
            return false;
        }

        match self.consents.check(user_id, purpose).await {
            Ok(granted) => granted,
            Err(e) => {
                error!(error = %e, "consent check failed, denying");
                false
            }
        }
    }

    /// 同意記録を取得
    pub async fn get_consent(&self, user_id: &str, purpose: &str) -> Result<ConsentRecord> {
        ensure_user_id(user_id)?;
        self.consents
            .get(user_id, purpose)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No consent recorded for subject {} and purpose {}",
                    user_id, purpose
                ))
            })
    }

    /// ユーザーの全同意記録を取得
    pub async fn list_consents(&self, user_id: &str) -> Result<Vec<ConsentRecord>> {
        ensure_user_id(user_id)?;
        self.consents.list(user_id).await
    }

    /// 同意を更新し、その操作を処理記録に残す
    ///
    /// ストア障害・入力不正時は false。
    #[instrument(skip(self))]
    pub async fn update_consent(&self, user_id: &str, purpose: &str, granted: bool) -> bool {
        if let Err(e) = ensure_user_id(user_id) {
            warn!(error = %e, "consent update rejected");
            return false;
        }
        if purpose.trim().is_empty() {
            warn!("consent update rejected: empty purpose");
            return false;
        }

        let _guard = self.locks.acquire(user_id).await;

        if let Err(e) = self
            .consents
            .update(user_id, purpose, granted, Utc::now())
            .await
        {
            error!(error = %e, "consent update failed");
            return false;
        }

        let activity_type = format!("consent_{}", purpose);
        let payload = json!({ "consent_type": purpose, "status": granted });
        if let Err(e) = self.record_activity(user_id, &activity_type, payload).await {
            warn!(error = %e, "consent updated but activity logging failed");
        }

        info!("consent {}", if granted { "granted" } else { "withdrawn" });
        true
    }

    /// データアクセス要求を処理
    ///
    /// 読み取り結果が正で、処理記録はベストエフォート。記録に失敗しても匿名化データは返す。
    #[instrument(skip(self))]
    pub async fn process_data_access_request(
        &self,
        user_id: &str,
    ) -> ComplianceResponse<AccessPayload> {
        if let Err(e) = ensure_user_id(user_id) {
            warn!(error = %e, "data access request rejected");
            return ComplianceResponse::error(e.to_string());
        }

        let _guard = self.locks.acquire(user_id).await;

        let lookup = match self.vault.get(user_id).await {
            Ok(lookup) => lookup,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "data access request failed");
                return ComplianceResponse::error(ACCESS_ERROR_MESSAGE);
            }
        };

        let anonymized = self.anonymizer.apply(&lookup.record);

        let payload = json!({
            "request_time": Utc::now().to_rfc3339(),
            "data_source": lookup.source,
        });
        if let Err(e) = self
            .record_activity(user_id, ACTIVITY_DATA_ACCESS, payload)
            .await
        {
            warn!(error = %e, "data access served but activity logging failed");
        }

        info!(data_source = ?lookup.source, "data access request processed");
        ComplianceResponse::success(AccessPayload {
            record: anonymized,
            data_source: lookup.source,
        })
    }

    /// 消去要求（忘れられる権利）を処理
    ///
    /// 処理記録 → 同意 → 個人データの順に、途中で失敗しても全ストアの削除を試みる。
    /// 全て成功した場合のみ success。既に消去済みでも success。
    #[instrument(skip(self))]
    pub async fn right_to_be_forgotten(&self, user_id: &str) -> ComplianceResponse<ErasureSummary> {
        if let Err(e) = ensure_user_id(user_id) {
            warn!(error = %e, "erasure request rejected");
            return ComplianceResponse::error(e.to_string());
        }

        let _guard = self.locks.acquire(user_id).await;

        let mut summary = ErasureSummary::default();
        let mut failures: Vec<String> = Vec::new();

        match self.activities.remove(user_id).await {
            Ok(removed) => summary.activities_removed = removed,
            Err(e) => {
                error!(error = %e, "failed to erase activity records");
                failures.push(format!("activity log: {}", e));
            }
        }

        match self.consents.remove(user_id).await {
            Ok(removed) => summary.consents_removed = removed,
            Err(e) => {
                error!(error = %e, "failed to erase consent records");
                failures.push(format!("consent store: {}", e));
            }
        }

        match self.vault.remove(user_id).await {
            Ok(removed) => summary.personal_data_removed = removed,
            Err(e) => {
                error!(error = %e, "failed to erase personal data");
                failures.push(format!("data vault: {}", e));
            }
        }

        if !failures.is_empty() {
            return ComplianceResponse::error(format!(
                "Unable to erase user data: {}",
                failures.join("; ")
            ));
        }

        // 消去の証跡は user_id ではなく仮名で残す
        let audit_subject = erasure_subject(user_id);
        let payload = json!({
            "activities_removed": summary.activities_removed,
            "consents_removed": summary.consents_removed,
            "personal_data_removed": summary.personal_data_removed,
        });
        if let Err(e) = self
            .activities
            .append(&audit_subject, ACTIVITY_ERASURE, payload, false)
            .await
        {
            warn!(error = %e, "user data erased but erasure audit record failed");
        }

        info!(
            activities = summary.activities_removed,
            consents = summary.consents_removed,
            personal_data = summary.personal_data_removed,
            "user data erased"
        );
        ComplianceResponse::success_with_message(summary, ERASURE_SUCCESS_MESSAGE)
    }

    /// データ処理を記録（現在の同意状態をスナップショット）
    #[instrument(skip(self, payload))]
    pub async fn log_activity(
        &self,
        user_id: &str,
        activity_type: &str,
        payload: Value,
    ) -> Result<ActivityRecord> {
        ensure_user_id(user_id)?;
        if activity_type.trim().is_empty() {
            return Err(Error::ValidationFailure(
                "activity_type must not be empty".to_string(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;
        self.record_activity(user_id, activity_type, payload).await
    }

    /// 処理記録を取得（None なら全件、挿入順）
    pub async fn get_logs(&self, user_id: Option<&str>) -> Result<Vec<ActivityRecord>> {
        self.activities.query(user_id).await
    }

    /// ユーザー・処理種別で絞り込んだ処理記録
    pub async fn get_logs_by_type(
        &self,
        user_id: Option<&str>,
        activity_type: Option<&str>,
    ) -> Result<Vec<ActivityRecord>> {
        self.activities.query_by_type(user_id, activity_type).await
    }

    /// 記録済みの処理種別
    pub async fn activity_types(&self) -> Result<Vec<String>> {
        self.activities.activity_types().await
    }

    /// 目的の検証とデータ最小化（記録は残さない）
    pub fn validate_and_minimize(&self, purpose: &str, fields: &FieldMap) -> MinimizationOutcome {
        self.minimization.evaluate(purpose, fields)
    }

    /// 最小化したデータのみを処理として記録
    ///
    /// 許可されていない目的は InvalidPurpose としてエラー応答。
    #[instrument(skip(self, fields))]
    pub async fn process_minimized(
        &self,
        user_id: &str,
        purpose: &str,
        fields: &FieldMap,
    ) -> ComplianceResponse<MinimizationOutcome> {
        if let Err(e) = ensure_user_id(user_id) {
            warn!(error = %e, "minimized processing rejected");
            return ComplianceResponse::error(e.to_string());
        }

        if fields.values().all(is_blank) {
            let e = Error::ValidationFailure("no data fields supplied".to_string());
            warn!(error = %e, "minimized processing rejected");
            return ComplianceResponse::error(e.to_string());
        }

        let outcome = self.validate_and_minimize(purpose, fields);
        if !outcome.is_valid {
            let e = Error::InvalidPurpose(purpose.to_string());
            warn!(error = %e, "minimized processing rejected");
            return ComplianceResponse::error(e.to_string());
        }

        let _guard = self.locks.acquire(user_id).await;

        let payload = Value::Object(outcome.minimized_fields.clone().into_iter().collect());
        if let Err(e) = self.record_activity(user_id, purpose, payload).await {
            error!(error = %e, "minimized processing could not be recorded");
            return ComplianceResponse::error("Unable to record data processing activity");
        }

        info!(
            kept = outcome.minimized_fields.len(),
            excluded = outcome.excluded_fields.len(),
            "data processing validated"
        );
        ComplianceResponse::success(outcome)
    }

    /// 個人データを丸ごと上書き保存
    #[instrument(skip(self, fields))]
    pub async fn store_personal_data(&self, user_id: &str, mut fields: FieldMap) -> Result<()> {
        ensure_user_id(user_id)?;
        // user_id は記録のキー、data_source は開示時に付与する
        fields.remove("user_id");
        fields.remove("data_source");

        let field_names: Vec<String> = fields.keys().cloned().collect();
        let record = PersonalDataRecord {
            user_id: user_id.to_string(),
            fields,
        };

        let _guard = self.locks.acquire(user_id).await;
        self.vault.put(record).await?;

        if let Err(e) = self
            .record_activity(
                user_id,
                ACTIVITY_DATA_STORED,
                json!({ "fields": field_names }),
            )
            .await
        {
            warn!(error = %e, "personal data stored but activity logging failed");
        }

        Ok(())
    }

    /// 処理記録を CSV で出力
    pub async fn export_logs_csv(&self, user_id: Option<&str>) -> Result<String> {
        let records = self.activities.query(user_id).await?;
        Ok(activities_to_csv(&records))
    }

    /// 保持期限切れの処理記録を削除
    pub async fn purge_expired_activities(&self) -> Result<usize> {
        self.activities.purge_expired(Utc::now()).await
    }

    /// 統計情報
    pub async fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            activity_logs: self.activities.len().await?,
            consent_records: self.consents.count().await?,
            registered_users: self.vault.count().await?,
        })
    }

    /// データ保護ポリシーの概要
    pub fn policy_details(&self) -> ProtectionPolicy {
        ProtectionPolicy::new(self.activities.retention())
    }

    /// 同意スナップショット付きで処理記録を追加（ロックは呼び出し側で取得済み）
    async fn record_activity(
        &self,
        user_id: &str,
        activity_type: &str,
        payload: Value,
    ) -> Result<ActivityRecord> {
        let purpose = &self.config.processing_consent_purpose;
        let consent_given = match self.consents.check(user_id, purpose).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "consent snapshot unavailable, recording as not given");
                false
            }
        };

        self.activities
            .append(user_id, activity_type, payload, consent_given)
            .await
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 消去証跡に使う仮名の主体ID
pub fn erasure_subject(user_id: &str) -> String {
    format!("erased:{}", sha256_hex(user_id))
}

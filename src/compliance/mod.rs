//! GDPR/CCPA Compliance Engine
//!
//! このモジュールは、GDPR（EU一般データ保護規則）およびCCPA（カリフォルニア州消費者プライバシー法）
//! に準拠したデータ主体の権利処理を提供します。
//!
//! ## 主要機能
//!
//! - **同意管理**: 目的別の同意取得・撤回（未記録は拒否扱い）
//! - **データアクセス権**: 匿名化した個人データの開示
//! - **削除権**: 処理記録・同意・個人データの一括消去
//! - **データ最小化**: 目的別の許可フィールドによる絞り込み
//! - **処理記録**: 同意スナップショットと保持期限付きの監査証跡
//!
//! ## 使用例
//!
//! ```rust
//! use privacy_compliance::compliance::ComplianceEngine;
//!
//! # async fn example() {
//! let engine = ComplianceEngine::new();
//!
//! engine.update_consent("user123", "marketing", true).await;
//! let response = engine.process_data_access_request("user123").await;
//! assert!(response.is_success());
//!
//! let erased = engine.right_to_be_forgotten("user123").await;
//! assert!(erased.is_success());
//! # }
//! ```

pub mod activity_log;
pub mod anonymizer;
pub mod consent_manager;
pub mod data_vault;
pub mod engine;
pub mod export;
pub mod minimization;
pub mod policy;
pub mod subject_lock;
pub mod types;

pub use activity_log::{ActivityLog, MemoryActivityLog};
pub use anonymizer::Anonymizer;
pub use consent_manager::{ConsentStore, MemoryConsentStore};
pub use data_vault::{DataVault, MemoryDataVault, VaultLookup};
pub use engine::ComplianceEngine;
pub use minimization::{MinimizationPolicy, MinimizationRule};
pub use policy::ProtectionPolicy;
pub use types::*;

//! Data Protection Policy
//!
//! 公開用のデータ保護ポリシー概要

use super::types::RetentionWindow;
use serde::{Deserialize, Serialize};

/// ポリシー最終更新日
pub const POLICY_LAST_UPDATED: &str = "April 8, 2025";

/// データ保護ポリシーの概要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtectionPolicy {
    pub last_updated: String,
    pub retention_period: String,
    pub data_access_process: String,
    pub erasure_process: String,
}

impl ProtectionPolicy {
    pub fn new(retention: RetentionWindow) -> Self {
        Self {
            last_updated: POLICY_LAST_UPDATED.to_string(),
            retention_period: retention.describe(),
            data_access_process: "Users can request their data through a data access request"
                .to_string(),
            erasure_process: "Users can request data deletion through a right to be forgotten request"
                .to_string(),
        }
    }
}

impl Default for ProtectionPolicy {
    fn default() -> Self {
        Self::new(RetentionWindow::default())
    }
}

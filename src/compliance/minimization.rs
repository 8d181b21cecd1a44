//! Data Minimization
//!
//! 目的別の許可フィールド表と検証

use super::types::{is_blank, FieldMap, MinimizationOutcome};
use serde::Serialize;

/// 目的ごとの許可フィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinimizationRule {
    pub purpose: &'static str,
    pub allowed_fields: &'static [&'static str],
}

/// 入力フォームの項目定義 (フィールド名, 必須か)
pub type FormField = (&'static str, bool);

const RULES: &[MinimizationRule] = &[
    MinimizationRule {
        purpose: "authentication",
        allowed_fields: &["username", "email"],
    },
    MinimizationRule {
        purpose: "transaction_processing",
        allowed_fields: &["user_id", "transaction_details"],
    },
    MinimizationRule {
        purpose: "fraud_prevention",
        allowed_fields: &["user_id", "transaction_history"],
    },
    MinimizationRule {
        purpose: "customer_support",
        allowed_fields: &["user_id", "contact_information"],
    },
];

const FORMS: &[(&str, &[FormField])] = &[
    (
        "authentication",
        &[
            ("username", true),
            ("email", true),
            ("phone", false),
            ("address", false),
        ],
    ),
    (
        "transaction_processing",
        &[("transaction_details", true), ("shipping_address", false)],
    ),
    (
        "fraud_prevention",
        &[("transaction_history", true), ("ip_address", false)],
    ),
    (
        "customer_support",
        &[("contact_information", true), ("issue_description", false)],
    ),
];

/// データ最小化ポリシー（静的設定）
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizationPolicy;

impl MinimizationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// 許可された目的（表の定義順）
    pub fn allowed_purposes(&self) -> Vec<&'static str> {
        RULES.iter().map(|rule| rule.purpose).collect()
    }

    pub fn is_valid(&self, purpose: &str) -> bool {
        self.rule(purpose).is_some()
    }

    pub fn rule(&self, purpose: &str) -> Option<&'static MinimizationRule> {
        RULES.iter().find(|rule| rule.purpose == purpose)
    }

    pub fn rules(&self) -> &'static [MinimizationRule] {
        RULES
    }

    /// 目的に必要なフィールドのみ残す。未知の目的は空
    pub fn minimize(&self, purpose: &str, fields: &FieldMap) -> FieldMap {
        let Some(rule) = self.rule(purpose) else {
            return FieldMap::new();
        };

        fields
            .iter()
            .filter(|(name, _)| rule.allowed_fields.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// 検証と最小化をまとめて実行
    ///
    /// 有効な目的なら、最小化結果が空でも `is_valid` は true。
    pub fn evaluate(&self, purpose: &str, fields: &FieldMap) -> MinimizationOutcome {
        let is_valid = self.is_valid(purpose);
        let minimized_fields = self.minimize(purpose, fields);
        let excluded_fields = fields
            .iter()
            .filter(|(name, value)| !minimized_fields.contains_key(*name) && !is_blank(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        MinimizationOutcome {
            is_valid,
            minimized_fields,
            excluded_fields,
        }
    }

    /// 目的別の入力項目
    pub fn form_fields(&self, purpose: &str) -> &'static [FormField] {
        FORMS
            .iter()
            .find(|(name, _)| *name == purpose)
            .map(|(_, fields)| *fields)
            .unwrap_or(&[])
    }
}

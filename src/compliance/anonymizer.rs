//! Anonymization
//!
//! 開示用にフィールドを決定的に秘匿化する

use super::types::PersonalDataRecord;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// 住所の置換文字列
pub const REDACTION_MARKER: &str = "*** REDACTED ***";
/// 電話番号のマスク文字
pub const MASK_CHAR: char = '*';

/// 開示用匿名化
///
/// - `email`: SHA-256 の16進ダイジェスト
/// - `phone`: 同じ文字数の `*`（末尾も残さない）
/// - `address`: 固定の秘匿マーカー
///
/// その他のフィールドはそのまま。入力は変更しない。
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymizer;

impl Anonymizer {
    pub fn new() -> Self {
        Self
    }

    /// 秘匿化したコピーを返す
    pub fn apply(&self, record: &PersonalDataRecord) -> PersonalDataRecord {
        let mut anonymized = record.clone();

        if let Some(email) = anonymized.fields.get_mut("email") {
            *email = Value::String(sha256_hex(&value_text(email)));
        }

        if let Some(phone) = anonymized.fields.get_mut("phone") {
            *phone = Value::String(mask(&value_text(phone)));
        }

        if let Some(address) = anonymized.fields.get_mut("address") {
            *address = Value::String(REDACTION_MARKER.to_string());
        }

        anonymized
    }
}

/// SHA-256 の小文字16進表現
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 文字数を保ったまま全体をマスク
fn mask(value: &str) -> String {
    MASK_CHAR.to_string().repeat(value.chars().count())
}

// 文字列以外は JSON 表現を対象にする
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PersonalDataRecord {
        PersonalDataRecord::new("user123")
            .with_field("email", "test@example.com")
            .with_field("phone", "1234567890")
            .with_field("address", "123 Test Street")
            .with_field("nickname", "jdoe")
    }

    #[test]
    fn test_email_is_hashed_deterministically() {
        let anonymizer = Anonymizer::new();
        let first = anonymizer.apply(&sample());
        let second = anonymizer.apply(&sample());

        let digest = first.get_str("email").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, "test@example.com");
        assert_eq!(first.get("email"), second.get("email"));
    }

    #[test]
    fn test_known_sha256_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_phone_is_fully_masked() {
        let anonymized = Anonymizer::new().apply(&sample());
        assert_eq!(anonymized.get_str("phone"), Some("**********"));
    }

    #[test]
    fn test_phone_mask_counts_characters() {
        let record = PersonalDataRecord::new("u").with_field("phone", "０９０１２");
        let anonymized = Anonymizer::new().apply(&record);
        assert_eq!(anonymized.get_str("phone"), Some("*****"));
    }

    #[test]
    fn test_address_is_redacted() {
        let anonymized = Anonymizer::new().apply(&sample());
        assert_eq!(anonymized.get_str("address"), Some(REDACTION_MARKER));
    }

    #[test]
    fn test_other_fields_pass_through_and_absent_stay_absent() {
        let record = PersonalDataRecord::new("user123").with_field("nickname", "jdoe");
        let anonymized = Anonymizer::new().apply(&record);

        assert_eq!(anonymized.user_id, "user123");
        assert_eq!(anonymized.get_str("nickname"), Some("jdoe"));
        assert!(anonymized.get("email").is_none());
        assert!(anonymized.get("phone").is_none());
        assert!(anonymized.get("address").is_none());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let record = sample();
        let _ = Anonymizer::new().apply(&record);
        assert_eq!(record, sample());
    }

    #[test]
    fn test_non_string_phone_is_masked() {
        let record = PersonalDataRecord::new("u").with_field("phone", json!(5551234));
        let anonymized = Anonymizer::new().apply(&record);
        assert_eq!(anonymized.get_str("phone"), Some("*******"));
    }
}

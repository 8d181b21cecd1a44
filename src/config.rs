//! Engine configuration
//!
//! 設定はデフォルト値 → TOML ファイル → `PRIVACY_*` 環境変数の順で上書きされる。

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, LogSettings};

/// サンプル設定ファイルの内容
pub fn sample_config() -> String {
    r#"# privacy-compliance configuration

# Activity record retention in days (minimum 730)
retention_days = 730

# Consent purpose snapshotted onto every logged activity
processing_consent_purpose = "data_processing"

[log]
level = "info"
console_enabled = true
json = false
"#
    .to_string()
}

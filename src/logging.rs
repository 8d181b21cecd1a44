use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// ログシステムを初期化
///
/// 既にグローバルサブスクライバーが設定済みの場合はエラーを返す。
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let env_filter = build_filter(&settings.level);

    let result = match (settings.console_enabled, settings.json) {
        (true, true) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        (true, false) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        (false, _) => {
            // 出力先なし：イベントは破棄する
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::sink)
                .try_init()
        }
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(
        level = %settings.level,
        console = settings.console_enabled,
        json = settings.json,
        "logging initialized"
    );

    Ok(())
}

/// `RUST_LOG` があればそれを優先し、なければ設定値、不正な値なら info
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

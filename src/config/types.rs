use serde::{Deserialize, Serialize};

use crate::compliance::types::{RetentionWindow, MIN_RETENTION_DAYS};
use crate::error::{Error, Result};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Retention window for activity records, in days (minimum 730)
    pub retention_days: u32,

    /// Consent purpose snapshotted onto every logged activity
    pub processing_consent_purpose: String,

    /// Logging configuration
    pub log: LogSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    /// Log level or EnvFilter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Write to stderr
    pub console_enabled: bool,

    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_days: MIN_RETENTION_DAYS,
            processing_consent_purpose: "data_processing".to_string(),
            log: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_enabled: true,
            json: false,
        }
    }
}

impl EngineConfig {
    /// Validate values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.retention()?;

        if self.processing_consent_purpose.trim().is_empty() {
            return Err(Error::Config(
                "processing_consent_purpose must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Retention window derived from `retention_days`
    pub fn retention(&self) -> Result<RetentionWindow> {
        RetentionWindow::new(self.retention_days)
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn with_processing_consent_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.processing_consent_purpose = purpose.into();
        self
    }
}

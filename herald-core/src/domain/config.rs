//! Plugin configuration

use serde::Serialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Plugin configuration
///
/// Built once from CLI flags / environment and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Log request and response bodies for every delivery
    pub debug: bool,
    /// Webhook URLs, contacted in order
    #[serde(rename = "Webhook")]
    pub webhooks: Vec<String>,
    /// Inline template overriding the default card
    pub message: Option<String>,
    /// Template file; takes precedence over `message`
    pub template_file: Option<PathBuf>,
}

impl Config {
    /// Checks the invariants required before anything is sent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhooks.is_empty() {
            return Err(ConfigError::MissingWebhook);
        }
        if self.webhooks.iter().any(|url| url.trim().is_empty()) {
            return Err(ConfigError::EmptyWebhook);
        }
        Ok(())
    }
}

//! Settings file handling. The file is TOML with the section and key names
//! the fleet's provisioning templates already emit.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("cannot open settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or is missing required keys.
    #[error("cannot parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

const fn default_keepalive_interval() -> u64 {
    10
}

/// Immutable configuration, constructed once at startup and passed into
/// each component. Nothing reads ambient state after this.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Membership table settings.
    #[serde(rename = "DynamoDB")]
    pub dynamodb: DynamoDbSettings,

    /// Liveness policy settings.
    pub general: GeneralSettings,
}

/// The `[DynamoDB]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct DynamoDbSettings {
    /// The name of the membership table.
    pub table: String,

    /// AWS region override. Resolved from the environment when absent.
    #[serde(default)]
    pub region: Option<String>,
}

/// The `[general]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneralSettings {
    /// Liveness window in seconds: the maximum keepalive age for a peer to
    /// count as reachable.
    #[serde(rename = "servers-timeout")]
    pub servers_timeout: u64,

    /// Deletion window in seconds: the keepalive age past which any
    /// participant removes the row from the table.
    #[serde(rename = "delete-timeout")]
    pub delete_timeout: u64,

    /// Seconds between keepalive publishes in the running phase.
    #[serde(rename = "keepalive-interval", default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Settings {
    /// Loads settings from the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// required section or key is missing.
    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let settings = toml::from_str(&raw)?;

        Ok(settings)
    }
}

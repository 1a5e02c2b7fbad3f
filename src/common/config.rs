//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment (`PANDRIVE_` prefix).

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_UPLOAD_PART_SIZE_BYTES: u64 = 64 * 1024 * 1024;
const MAX_PAGE_SIZE: u32 = 500;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "pandrive")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("pandrive.toml"))
}

/// Endpoints of the drive service. The dispatcher host serves the JSON API;
/// uploads go to a dedicated ingest host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub upload_url: String,
    /// Items requested per listing page.
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://drive.example.com/api".to_string(),
            upload_url: "https://upload.drive.example.com/api".to_string(),
            page_size: 100,
        }
    }
}

/// Upload and refresh tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Upload part size in bytes.
    pub part_size: u64,
    /// Delay before refreshing a listing after a successful upload, giving
    /// the service time to make the change visible.
    pub refresh_settle_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            part_size: 32 * 1024 * 1024,
            refresh_settle_ms: 1000,
        }
    }
}

impl TransferSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_settle_ms)
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Access token for the drive service. Usually supplied via
    /// `PANDRIVE_TOKEN` or the config file rather than the command line.
    pub token: String,
    pub api: ApiSettings,
    pub transfer: TransferSettings,
}

impl AppConfig {
    /// Validates tuning bounds and rejects unusable values.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.transfer.part_size > 0,
            "Invalid config: transfer.part_size must be > 0"
        );
        ensure!(
            self.transfer.part_size <= MAX_UPLOAD_PART_SIZE_BYTES,
            "Invalid config: transfer.part_size must be <= {MAX_UPLOAD_PART_SIZE_BYTES}"
        );
        ensure!(
            self.api.page_size >= 1,
            "Invalid config: api.page_size must be >= 1"
        );
        ensure!(
            self.api.page_size <= MAX_PAGE_SIZE,
            "Invalid config: api.page_size must be <= {MAX_PAGE_SIZE}"
        );
        ensure!(
            !self.api.base_url.trim().is_empty(),
            "Invalid config: api.base_url must not be empty"
        );
        Ok(())
    }
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("PANDRIVE_").split("_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

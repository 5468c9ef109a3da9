//! Runtime configuration. Every field has a default, so a config file only
//! needs the keys it changes.

use crate::api::DEFAULT_BASE_URL;
use crate::element::Palette;
use crate::orchestrator::{
    DEFAULT_INDICATOR, DEFAULT_INDICATOR_LABEL, DEFAULT_WINDOW_YEARS, IndicatorSettings,
};
use crate::store::PROFILE_TTL_DAYS;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub profile_ttl_days: i64,
    pub indicator_id: String,
    /// Chart title for the indicator series.
    pub indicator_label: String,
    pub indicator_window_years: u32,
    /// Where persisted selection state lives; `None` means the platform data dir.
    pub storage_dir: Option<PathBuf>,
    pub palette: Palette,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            profile_ttl_days: PROFILE_TTL_DAYS,
            indicator_id: DEFAULT_INDICATOR.to_string(),
            indicator_label: DEFAULT_INDICATOR_LABEL.to_string(),
            indicator_window_years: DEFAULT_WINDOW_YEARS,
            storage_dir: None,
            palette: Palette::default(),
        }
    }
}

impl ExplorerConfig {
    /// Read a JSON config file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.profile_ttl_days <= 0 {
            bail!("profile_ttl_days must be positive");
        }
        if self.indicator_id.trim().is_empty() {
            bail!("indicator_id must not be empty");
        }
        if self.indicator_window_years == 0 {
            bail!("indicator_window_years must be at least 1");
        }
        Ok(())
    }

    /// Effective storage directory: configured, else `<data dir>/wbmap`, else `./.wbmap`.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("wbmap"))
                .unwrap_or_else(|| PathBuf::from(".wbmap"))
        })
    }

    pub fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings {
            indicator_id: self.indicator_id.clone(),
            window_years: self.indicator_window_years,
        }
    }
}

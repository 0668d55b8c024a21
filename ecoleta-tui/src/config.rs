//! User configuration loaded from the platform config directory.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ecoleta_core::{FormOptions, RetryPolicy, map::OSM_TILE_URL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
/// Where the map centre comes from.
pub(crate) enum GeolocationConfig {
    /// Public IP lookup.
    Ip,
    /// Fixed coordinate.
    Fixed { latitude: f64, longitude: f64 },
    /// No lookup; the map stays at the origin.
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TuiConfig {
    /// Root of the Ecoleta API serving `/items`.
    pub catalog_url: String,
    /// Root of the IBGE localidades API.
    pub geography_url: String,
    pub geolocation: GeolocationConfig,
    pub geolocation_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Tries per catalog/geography request, including the first.
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub map_zoom: u8,
    pub tile_url: String,
    pub reset_city_on_state_change: bool,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            catalog_url: ecoleta_provider_catalog::DEFAULT_BASE_URL.to_owned(),
            geography_url: ecoleta_provider_ibge::BASE_URL.to_owned(),
            geolocation: GeolocationConfig::Ip,
            geolocation_timeout_ms: 4000,
            request_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_base_delay_ms: 250,
            map_zoom: 4,
            tile_url: OSM_TILE_URL.to_owned(),
            reset_city_on_state_change: true,
            log_filter: "ecoleta=info".to_owned(),
        }
    }
}

impl TuiConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("br", "ecoleta", "ecoleta-tui")
    }

    /// Get the config file path
    pub(crate) fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Directory for the log file.
    pub(crate) fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load configuration from file, falling back to defaults when it does not exist.
    pub(crate) fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?;
                Self::from_json(&content).with_context(|| format!("parse {}", path.display()))
            }
            _ => Ok(Self::default()),
        }
    }

    pub(crate) fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub(crate) fn form_options(&self) -> FormOptions {
        FormOptions {
            reset_city_on_state_change: self.reset_city_on_state_change,
        }
    }
}

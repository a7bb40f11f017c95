//! Configuration system for visualdisk

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::viz::rings::RingConfig;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const API_BASE_ENV: &str = "VISUALDISK_API_BASE";

const MIN_REFRESH_SECS: f64 = 0.5;
const MAX_REFRESH_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub display: DisplayConfig,
    pub rings: RingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        if !config.refresh.interval_secs.is_finite() {
            anyhow::bail!(
                "{}: refresh.interval_secs must be a finite number of seconds",
                path.display()
            );
        }
        Ok(config)
    }

    /// Load from `path` when given, else from the default location. A missing default
    /// file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("visualdisk").join("config.toml"))
    }

    /// Command line (or environment, via clap) wins over the file.
    pub fn resolve_api_base(&mut self, cli: Option<String>) {
        if let Some(base) = cli.filter(|b| !b.trim().is_empty()) {
            self.api.base_url = base;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Clamped to between half a second and a day. Non-finite values fall back to the default.
    pub fn refresh_interval(&self) -> Duration {
        let secs = self.refresh.interval_secs;
        if !secs.is_finite() {
            tracing::warn!(secs, "invalid refresh interval, using default");
            return Duration::from_secs_f64(RefreshConfig::default().interval_secs);
        }
        Duration::from_secs_f64(secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS))
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.display.fps.max(1) as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Snapshots listed in the dashboard
    pub snapshot_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 10,
            snapshot_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: f64,
    pub auto_start: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            auto_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: String,
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "tokyo-night".to_string(),
            fps: 30,
        }
    }
}

/// Write a default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Configuration already exists. Use --force to overwrite.");
    }

    Config::default().save(path)?;
    println!("Created {}", path.display());
    Ok(())
}

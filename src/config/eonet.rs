// src/config/eonet.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_CONFIG_PATH: &str = "config/eonet.toml";

pub const ENV_CONFIG_PATH: &str = "EONET_CONFIG_PATH";
pub const ENV_BASE_URL: &str = "EONET_BASE_URL";
pub const ENV_LOOKBACK_DAYS: &str = "EONET_LOOKBACK_DAYS";
pub const ENV_MAX_CONCURRENT: &str = "EONET_MAX_CONCURRENT";

pub const DEFAULT_BASE_URL: &str = "https://eonet.sci.gsfc.nasa.gov/api/v2.1";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 360;
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EonetConfig {
    pub base_url: String,
    pub categories_endpoint: String,
    /// Used for categories that carry no endpoint of their own.
    pub events_endpoint: String,
    pub lookback_days: u32,
    /// Upper bound on per-category fetches in flight at once.
    pub max_concurrent: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// How long the CLI keeps the progress line after reaching 1.0.
    pub progress_hide_delay_ms: u64,
}

impl Default for EonetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            categories_endpoint: "/categories".to_string(),
            events_endpoint: "/events".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            connect_timeout_secs: 4,
            request_timeout_secs: 10,
            user_agent: concat!("eonet-aggregator/", env!("CARGO_PKG_VERSION")).to_string(),
            progress_hide_delay_ms: 1000,
        }
    }
}

impl EonetConfig {
    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EonetConfig = toml::from_str(s).context("parsing eonet config toml")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading eonet config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve config using env var + fallbacks, then apply env overrides:
    /// 1) $EONET_CONFIG_PATH
    /// 2) config/eonet.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg.sanitized())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = env::var(ENV_BASE_URL)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            self.base_url = url;
        }
        if let Some(days) = parse_env::<u32>(ENV_LOOKBACK_DAYS) {
            self.lookback_days = days;
        }
        if let Some(n) = parse_env::<usize>(ENV_MAX_CONCURRENT) {
            self.max_concurrent = n;
        }
    }

    fn sanitized(mut self) -> Self {
        self.max_concurrent = self.max_concurrent.max(1);
        self.lookback_days = self.lookback_days.max(1);
        self
    }
}

// Unparseable values are ignored rather than failing startup.
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

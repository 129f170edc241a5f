// src/config/services.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "ML_SERVICES_CONFIG_PATH";
pub const ENV_SERVICE_TRENDS_BASE_URL: &str = "SERVICE_TRENDS_BASE_URL";
pub const ENV_PROMOTIONS_BASE_URL: &str = "PROMOTIONS_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "ML_REQUEST_TIMEOUT_MS";

pub const DEFAULT_SERVICE_TRENDS_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_PROMOTIONS_BASE_URL: &str = "http://localhost:5002/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Where the two ML services live and how long to wait for each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub service_trends_base_url: String,
    pub promotions_base_url: String,
    pub timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            service_trends_base_url: DEFAULT_SERVICE_TRENDS_BASE_URL.to_string(),
            promotions_base_url: DEFAULT_PROMOTIONS_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ServicesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ml services config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $ML_SERVICES_CONFIG_PATH
    /// 2) config/ml_services.toml
    /// 3) config/ml_services.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let toml_p = PathBuf::from("config/ml_services.toml");
            let json_p = PathBuf::from("config/ml_services.json");
            if toml_p.exists() {
                Self::load_from_file(&toml_p)?
            } else if json_p.exists() {
                Self::load_from_file(&json_p)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides().validated()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_SERVICE_TRENDS_BASE_URL) {
            if !v.trim().is_empty() {
                self.service_trends_base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_PROMOTIONS_BASE_URL) {
            if !v.trim().is_empty() {
                self.promotions_base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_TIMEOUT_MS) {
            match v.trim().parse::<u64>() {
                Ok(ms) => self.timeout_ms = ms,
                Err(e) => tracing::warn!(
                    value = %v,
                    error = %e,
                    keeping_ms = self.timeout_ms,
                    "{ENV_TIMEOUT_MS} is not a whole number of milliseconds, ignoring"
                ),
            }
        }
        self
    }

    /// Base URLs must be absolute http(s); a zero timeout falls back to the default.
    pub fn validated(mut self) -> Result<Self> {
        check_base_url("service_trends_base_url", &self.service_trends_base_url)?;
        check_base_url("promotions_base_url", &self.promotions_base_url)?;
        if self.timeout_ms == 0 {
            tracing::warn!(default_ms = DEFAULT_TIMEOUT_MS, "timeout_ms=0 is not allowed, using default");
            self.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        Ok(self)
    }
}

fn check_base_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{field}: invalid url {value:?}"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(anyhow!("{field}: expected an absolute http(s) url, got {value:?}"));
    }
    Ok(())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ServicesConfig> {
    // Try TOML first if hinted, JSON next, then TOML as a last resort.
    if hint_ext == "toml" {
        if let Ok(v) = toml::from_str::<ServicesConfig>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<ServicesConfig>(s) {
        return Ok(v);
    }
    if hint_ext != "toml" {
        if let Ok(v) = toml::from_str::<ServicesConfig>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported ml services config format"))
}

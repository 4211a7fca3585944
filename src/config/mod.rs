// src/config/mod.rs
//! Process configuration: a TOML file for settings, environment variables for
//! secrets and the recipient override.

pub mod app;

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub use app::AppConfig;

const ENV_PATH: &str = "ALERTS_CONFIG_PATH";
const ENV_RECIPIENTS: &str = "ALERT_RECIPIENTS";
const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
const ENV_SMTP_USERNAME: &str = "SMTP_USERNAME";
const ENV_SMTP_PASSWORD: &str = "SMTP_PASSWORD";

/// Load config from an explicit TOML path, then apply env overrides.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(finish(cfg))
}

/// Load config using env var + fallbacks:
/// 1) $ALERTS_CONFIG_PATH
/// 2) config/alerts.toml
/// 3) built-in defaults
pub fn load_config_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("ALERTS_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/alerts.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    Ok(finish(AppConfig::default()))
}

fn finish(mut cfg: AppConfig) -> AppConfig {
    if let Ok(list) = std::env::var(ENV_RECIPIENTS) {
        let from_env: Vec<String> = list.split(',').map(str::to_string).collect();
        if from_env.iter().any(|s| !s.trim().is_empty()) {
            cfg.notify.recipients = from_env;
        }
    }
    cfg.sanitize();
    cfg
}

/// Credentials supplied by the environment only; never read from files.
#[derive(Clone, Default)]
pub struct Secrets {
    pub news_api_key: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |k: &str| {
            std::env::var(k)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            news_api_key: var(ENV_NEWS_API_KEY),
            smtp_username: var(ENV_SMTP_USERNAME),
            smtp_password: var(ENV_SMTP_PASSWORD),
        }
    }

    /// Both halves or nothing.
    pub fn smtp_credentials(&self) -> Option<(String, String)> {
        match (&self.smtp_username, &self.smtp_password) {
            (Some(u), Some(p)) => Some((u.clone(), p.clone())),
            _ => None,
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |o: &Option<String>| if o.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("news_api_key", &mask(&self.news_api_key))
            .field("smtp_username", &mask(&self.smtp_username))
            .field("smtp_password", &mask(&self.smtp_password))
            .finish()
    }
}

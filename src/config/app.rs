// src/config/app.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::http::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::ingest::providers::{gdacs_rss, news_api, reliefweb, usgs};
use crate::scheduler::DEFAULT_INTERVAL;
use crate::snapshot::DEFAULT_SNAPSHOT_PATH;

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL.as_secs()
}
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub snapshot: SnapshotSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub notify: NotifySection,
    /// Overrides the rules lookup (`$ALERT_RULES_PATH`, then `config/rules.*`).
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSection {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    pub seismic_url: String,
    pub disaster_feed_url: String,
    pub humanitarian_report_url: String,
    pub news_search_url: String,
    pub news_query: String,
    pub fetch_timeout_secs: u64,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            seismic_url: usgs::DEFAULT_URL.to_string(),
            disaster_feed_url: gdacs_rss::DEFAULT_URL.to_string(),
            humanitarian_report_url: reliefweb::DEFAULT_URL.to_string(),
            news_search_url: news_api::DEFAULT_URL.to_string(),
            news_query: news_api::DEFAULT_QUERY.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySection {
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub from: Option<String>,
    /// When unset, alerts go to the log instead of an SMTP relay.
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            from: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
        }
    }
}

impl AppConfig {
    /// Clamp nonsensical values back to defaults and tidy the recipient list.
    pub fn sanitize(&mut self) {
        if self.scheduler.interval_secs == 0 {
            self.scheduler.interval_secs = default_interval_secs();
        }
        if self.sources.fetch_timeout_secs == 0 {
            self.sources.fetch_timeout_secs = DEFAULT_FETCH_TIMEOUT_SECS;
        }
        if self.sources.news_query.trim().is_empty() {
            self.sources.news_query = news_api::DEFAULT_QUERY.to_string();
        }
        self.notify.recipients = clean_list(std::mem::take(&mut self.notify.recipients));
        self.notify.smtp_host = self
            .notify
            .smtp_host
            .take()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
    }

    /// Startup checks that cannot be defaulted away.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notify.recipients.is_empty() {
            anyhow::bail!("no alert recipients configured (notify.recipients or ALERT_RECIPIENTS)");
        }
        if self.notify.smtp_host.is_some() && self.notify.from.is_none() {
            anyhow::bail!("notify.from is required when notify.smtp_host is set");
        }
        Ok(())
    }
}

/// Trim, drop empties, dedup (sorted).
pub(crate) fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}

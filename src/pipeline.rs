// src/pipeline.rs
//! One run: fetch → snapshot → persist → reload → evaluate → notify.

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::analyze::{load_rules_default, load_rules_from, RuleEngine};
use crate::config::{AppConfig, Secrets};
use crate::error::PipelineError;
use crate::ingest::{
    self,
    http::build_client,
    providers::{GdacsRssConnector, NewsApiConnector, ReliefWebConnector, UsgsConnector},
    types::{SourceConnector, SourceId},
};
use crate::notify::{Dispatcher, EmailTransport, LogTransport, MessageTransport};
use crate::snapshot::{Snapshot, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub unavailable: Vec<SourceId>,
    pub alerts: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Pipeline {
    connectors: Vec<Box<dyn SourceConnector>>,
    store: SnapshotStore,
    engine: RuleEngine,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn new(
        connectors: Vec<Box<dyn SourceConnector>>,
        store: SnapshotStore,
        engine: RuleEngine,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            connectors,
            store,
            engine,
            dispatcher,
        }
    }

    /// Wire the four live connectors, the store, rules and transport from config.
    pub fn from_config(cfg: &AppConfig, secrets: &Secrets) -> anyhow::Result<Self> {
        let src = &cfg.sources;
        let client = build_client(src.fetch_timeout_secs).context("building http client")?;

        let connectors: Vec<Box<dyn SourceConnector>> = vec![
            Box::new(UsgsConnector::from_url(&src.seismic_url, client.clone())?),
            Box::new(GdacsRssConnector::from_url(&src.disaster_feed_url, client.clone())?),
            Box::new(ReliefWebConnector::from_url(
                &src.humanitarian_report_url,
                client.clone(),
            )?),
            Box::new(NewsApiConnector::from_url(
                &src.news_search_url,
                &src.news_query,
                secrets.news_api_key.as_deref(),
                client,
            )?),
        ];
        if secrets.news_api_key.is_none() {
            tracing::warn!("NEWS_API_KEY not set; news search will be unavailable");
        }

        let rules = match &cfg.rules_path {
            Some(p) => load_rules_from(p)?,
            None => load_rules_default()?,
        };
        let engine = RuleEngine::new(rules)?;

        let transport: Box<dyn MessageTransport> = match &cfg.notify.smtp_host {
            Some(host) => {
                let from = cfg
                    .notify
                    .from
                    .as_deref()
                    .context("notify.from is required with smtp_host")?;
                Box::new(EmailTransport::new(
                    host,
                    cfg.notify.smtp_port,
                    from,
                    secrets.smtp_credentials(),
                )?)
            }
            None => {
                tracing::warn!("no SMTP relay configured; alerts will only be logged");
                Box::new(LogTransport)
            }
        };
        let dispatcher = Dispatcher::new(transport, cfg.notify.recipients.clone());

        Ok(Self::new(
            connectors,
            SnapshotStore::new(&cfg.snapshot.path),
            engine,
            dispatcher,
        ))
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// A persistence failure aborts the run before any alert is derived.
    pub async fn run_at(&self, started: DateTime<Utc>) -> Result<RunReport, PipelineError> {
        let results = ingest::fetch_all(&self.connectors).await;
        let snapshot = Snapshot::new(started, results);
        let unavailable = snapshot.unavailable();

        self.store
            .save(&snapshot)
            .await
            .map_err(PipelineError::Persistence)?;

        let current = self.store.load().await.map_err(PipelineError::Reload)?;
        let events = self.engine.evaluate(&current);
        let summary = self.dispatcher.notify_all(&events).await;

        Ok(RunReport {
            timestamp: started,
            unavailable,
            alerts: events.len(),
            delivered: summary.delivered,
            failed: summary.failed,
        })
    }
}

// tests/common/mod.rs
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use disaster_alerts::error::{DeliveryError, FetchError};
use disaster_alerts::ingest::providers::{
    GdacsRssConnector, NewsApiConnector, ReliefWebConnector, UsgsConnector,
};
use disaster_alerts::{
    Dispatcher, MessageTransport, OutboundMessage, Payload, Pipeline, RuleEngine, RuleSet,
    SnapshotStore, SourceConnector, SourceId,
};
use parking_lot::Mutex;

pub const USGS: &str = include_str!("../fixtures/usgs_all_day.geojson");
pub const GDACS: &str = include_str!("../fixtures/gdacs_rss.xml");
pub const RELIEFWEB: &str = include_str!("../fixtures/reliefweb_reports.json");
pub const NEWSAPI: &str = include_str!("../fixtures/newsapi_everything.json");

pub fn recipients() -> Vec<String> {
    vec!["contact1@example.com".into(), "contact2@example.com".into()]
}

/// Transport that records every message instead of sending it.
#[derive(Clone, Default)]
pub struct Recorder {
    pub sent: Arc<Mutex<Vec<(OutboundMessage, Vec<String>)>>>,
}

impl Recorder {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(m, _)| m.subject.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MessageTransport for Recorder {
    async fn deliver(
        &self,
        msg: &OutboundMessage,
        recipients: &[String],
    ) -> Result<(), DeliveryError> {
        self.sent.lock().push((msg.clone(), recipients.to_vec()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Connector that always fails, standing in for an unreachable upstream.
pub struct Down(pub SourceId);

#[async_trait]
impl SourceConnector for Down {
    fn source_id(&self) -> SourceId {
        self.0
    }

    async fn fetch_payload(&self) -> Result<Payload, FetchError> {
        Err(FetchError::Status(503))
    }
}

pub fn usgs(body: &str) -> Box<dyn SourceConnector> {
    Box::new(UsgsConnector::from_fixture(body))
}

pub fn gdacs(body: &str) -> Box<dyn SourceConnector> {
    Box::new(GdacsRssConnector::from_fixture(body))
}

pub fn reliefweb(body: &str) -> Box<dyn SourceConnector> {
    Box::new(ReliefWebConnector::from_fixture(body))
}

pub fn news(body: &str) -> Box<dyn SourceConnector> {
    Box::new(NewsApiConnector::from_fixture(body))
}

pub fn down(id: SourceId) -> Box<dyn SourceConnector> {
    Box::new(Down(id))
}

pub fn rss(items: &[(&str, &str)]) -> String {
    let mut xml = String::from("<rss version=\"2.0\"><channel><title>GDACS</title>");
    for (title, link) in items {
        xml.push_str(&format!("<item><title>{title}</title><link>{link}</link></item>"));
    }
    xml.push_str("</channel></rss>");
    xml
}

pub fn pipeline(
    connectors: Vec<Box<dyn SourceConnector>>,
    snapshot_path: &Path,
    transport: &Recorder,
) -> Pipeline {
    Pipeline::new(
        connectors,
        SnapshotStore::new(snapshot_path),
        RuleEngine::new(RuleSet::default()).expect("default rules"),
        Dispatcher::new(Box::new(transport.clone()), recipients()),
    )
}

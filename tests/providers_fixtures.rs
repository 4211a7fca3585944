// tests/providers_fixtures.rs
mod common;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::*;
use disaster_alerts::error::FetchError;
use disaster_alerts::ingest::{self, types::Payload};
use disaster_alerts::{FetchStatus, SourceConnector, SourceId};

#[tokio::test]
async fn usgs_fixture_keeps_null_magnitude_records() {
    let res = usgs(USGS).fetch().await;
    assert_eq!(res.source_id, SourceId::Seismic);
    let Some(Payload::Seismic(p)) = res.payload else {
        panic!("expected seismic payload");
    };
    let mags: Vec<Option<f64>> = p.features.iter().map(|f| f.properties.mag).collect();
    assert_eq!(mags, vec![Some(1.8), Some(4.6), Some(6.2), None]);
}

#[tokio::test]
async fn gdacs_fixture_decodes_links() {
    let res = gdacs(GDACS).fetch().await;
    let Some(Payload::DisasterFeed(entries)) = res.payload else {
        panic!("expected feed payload");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0].link,
        "https://www.gdacs.org/report.aspx?eventtype=TS&eventid=1001"
    );
    assert_eq!(entries[1].title, "Green alert for flood in Somalia");
}

#[tokio::test]
async fn reliefweb_fixture_cleans_titles() {
    let res = reliefweb(RELIEFWEB).fetch().await;
    let Some(Payload::HumanitarianReport(p)) = res.payload else {
        panic!("expected report payload");
    };
    assert_eq!(
        p.data[2].fields.title,
        "Regional & cross-border coordination update"
    );
}

#[tokio::test]
async fn fetch_all_never_lets_one_failure_hide_others() {
    let connectors = vec![
        usgs("<html>oops</html>"),
        down(SourceId::DisasterFeed),
        reliefweb(RELIEFWEB),
        news(NEWSAPI),
    ];
    let results = ingest::fetch_all(&connectors).await;
    let statuses: Vec<(SourceId, FetchStatus)> =
        results.iter().map(|r| (r.source_id, r.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (SourceId::Seismic, FetchStatus::FetchError),
            (SourceId::DisasterFeed, FetchStatus::FetchError),
            (SourceId::HumanitarianReport, FetchStatus::Ok),
            (SourceId::NewsSearch, FetchStatus::Ok),
        ]
    );
    assert!(results[0].payload.is_none());
}

/// Wraps a connector and holds every fetch for a fixed delay.
struct Slow {
    inner: Box<dyn SourceConnector>,
    delay: Duration,
}

#[async_trait]
impl SourceConnector for Slow {
    fn source_id(&self) -> SourceId {
        self.inner.source_id()
    }

    async fn fetch_payload(&self) -> Result<Payload, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_payload().await
    }
}

fn slow(inner: Box<dyn SourceConnector>, ms: u64) -> Box<dyn SourceConnector> {
    Box::new(Slow {
        inner,
        delay: Duration::from_millis(ms),
    })
}

#[tokio::test]
async fn slow_connector_does_not_hold_up_siblings() {
    let connectors = vec![
        slow(usgs(USGS), 400),
        slow(down(SourceId::DisasterFeed), 400),
        slow(reliefweb(RELIEFWEB), 400),
        news(NEWSAPI),
    ];

    let t0 = Instant::now();
    let results = ingest::fetch_all(&connectors).await;
    let elapsed = t0.elapsed();

    assert!(
        elapsed < Duration::from_millis(1000),
        "connectors ran one after another: {elapsed:?}"
    );
    let order: Vec<SourceId> = results.iter().map(|r| r.source_id).collect();
    assert_eq!(order, SourceId::ALL.to_vec());
    assert_eq!(results[1].status, FetchStatus::FetchError);
    assert!(results[0].is_ok() && results[2].is_ok() && results[3].is_ok());
}

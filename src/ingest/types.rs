// src/ingest/types.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Identity of one upstream feed. Declaration order is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Seismic,
    DisasterFeed,
    HumanitarianReport,
    NewsSearch,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Seismic,
        SourceId::DisasterFeed,
        SourceId::HumanitarianReport,
        SourceId::NewsSearch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Seismic => "seismic",
            SourceId::DisasterFeed => "disaster_feed",
            SourceId::HumanitarianReport => "humanitarian_report",
            SourceId::NewsSearch => "news_search",
        }
    }

    /// Key of this source in the persisted snapshot document.
    pub fn document_key(self) -> &'static str {
        match self {
            SourceId::Seismic => "earthquake_data",
            SourceId::DisasterFeed => "gdacs_rss_data",
            SourceId::HumanitarianReport => "reliefweb_data",
            SourceId::NewsSearch => "google_news_data",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    FetchError,
}

// ---- per-source payload schemas ----

/// USGS GeoJSON summary feed (only the fields the rules look at).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicPayload {
    pub features: Vec<QuakeFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeFeature {
    pub properties: QuakeProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeProperties {
    // USGS publishes `null` magnitudes for some reviewed events.
    pub mag: Option<f64>,
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One GDACS RSS item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
}

/// ReliefWeb `/v1/reports` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub data: Vec<Report>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub fields: ReportFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFields {
    pub title: String,
    pub url: String,
}

/// NewsAPI `/v2/everything` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPayload {
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Seismic(SeismicPayload),
    DisasterFeed(Vec<FeedEntry>),
    HumanitarianReport(ReportPayload),
    NewsSearch(NewsPayload),
}

impl Payload {
    pub fn source_id(&self) -> SourceId {
        match self {
            Payload::Seismic(_) => SourceId::Seismic,
            Payload::DisasterFeed(_) => SourceId::DisasterFeed,
            Payload::HumanitarianReport(_) => SourceId::HumanitarianReport,
            Payload::NewsSearch(_) => SourceId::NewsSearch,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Seismic(p) => p.features.len(),
            Payload::DisasterFeed(v) => v.len(),
            Payload::HumanitarianReport(p) => p.data.len(),
            Payload::NewsSearch(p) => p.articles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uniform view over the record collection, in payload order.
    pub fn records(&self) -> Vec<RecordFields<'_>> {
        match self {
            Payload::Seismic(p) => p
                .features
                .iter()
                .map(|f| RecordFields {
                    title: None,
                    magnitude: f.properties.mag,
                    place: f.properties.place.as_deref(),
                    url: f.properties.url.as_deref(),
                })
                .collect(),
            Payload::DisasterFeed(v) => v
                .iter()
                .map(|e| RecordFields {
                    title: Some(&e.title),
                    url: Some(&e.link),
                    ..RecordFields::default()
                })
                .collect(),
            Payload::HumanitarianReport(p) => p
                .data
                .iter()
                .map(|r| RecordFields {
                    title: Some(&r.fields.title),
                    url: Some(&r.fields.url),
                    ..RecordFields::default()
                })
                .collect(),
            Payload::NewsSearch(p) => p
                .articles
                .iter()
                .map(|a| RecordFields {
                    title: Some(&a.title),
                    url: Some(&a.url),
                    ..RecordFields::default()
                })
                .collect(),
        }
    }
}

/// Borrowed, source-agnostic view of one payload record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordFields<'a> {
    pub title: Option<&'a str>,
    pub magnitude: Option<f64>,
    pub place: Option<&'a str>,
    pub url: Option<&'a str>,
}

/// One connector's output for one run. `payload` is `Some` iff `status == Ok`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub source_id: SourceId,
    pub status: FetchStatus,
    pub payload: Option<Payload>,
}

impl SourceResult {
    pub fn ok(payload: Payload) -> Self {
        Self {
            source_id: payload.source_id(),
            status: FetchStatus::Ok,
            payload: Some(payload),
        }
    }

    pub fn failed(source_id: SourceId) -> Self {
        Self {
            source_id,
            status: FetchStatus::FetchError,
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

#[async_trait::async_trait]
pub trait SourceConnector: Send + Sync {
    fn source_id(&self) -> SourceId;

    /// Fetch and validate the upstream dataset. Errors stay inside `fetch`.
    async fn fetch_payload(&self) -> Result<Payload, FetchError>;

    async fn fetch(&self) -> SourceResult {
        let source = self.source_id();
        match self.fetch_payload().await {
            Ok(payload) if payload.is_empty() => {
                tracing::warn!(source = %source, error = %FetchError::Empty, "source unavailable");
                metrics::counter!("source_fetch_errors_total", "source" => source.as_str())
                    .increment(1);
                SourceResult::failed(source)
            }
            Ok(payload) => {
                tracing::debug!(source = %source, records = payload.len(), "source fetched");
                SourceResult::ok(payload)
            }
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "source unavailable");
                metrics::counter!("source_fetch_errors_total", "source" => source.as_str())
                    .increment(1);
                SourceResult::failed(source)
            }
        }
    }
}

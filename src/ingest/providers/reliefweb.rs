// src/ingest/providers/reliefweb.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;

use crate::error::FetchError;
use crate::ingest::clean_text;
use crate::ingest::http::Mode;
use crate::ingest::types::{Payload, ReportPayload, SourceConnector, SourceId};

pub const DEFAULT_URL: &str =
    "https://api.reliefweb.int/v1/reports?appname=apidoc&fields[include][]=url";

/// Humanitarian-report connector for the ReliefWeb reports API.
pub struct ReliefWebConnector {
    mode: Mode,
}

impl ReliefWebConnector {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::fixture(s),
        }
    }

    pub fn from_url(url: &str, client: Client) -> Result<Self, FetchError> {
        Ok(Self {
            mode: Mode::http(url, client)?,
        })
    }

    fn parse(body: &str) -> Result<ReportPayload, FetchError> {
        let t0 = std::time::Instant::now();
        let mut payload: ReportPayload = serde_json::from_str(body)?;
        for r in &mut payload.data {
            r.fields.title = clean_text(&r.fields.title);
        }
        histogram!("ingest_parse_ms", "source" => "humanitarian_report")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(payload)
    }
}

#[async_trait]
impl SourceConnector for ReliefWebConnector {
    fn source_id(&self) -> SourceId {
        SourceId::HumanitarianReport
    }

    async fn fetch_payload(&self) -> Result<Payload, FetchError> {
        let body = self.mode.body().await?;
        Self::parse(&body).map(Payload::HumanitarianReport)
    }
}

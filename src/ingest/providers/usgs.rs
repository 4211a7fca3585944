// src/ingest/providers/usgs.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;

use crate::error::FetchError;
use crate::ingest::http::Mode;
use crate::ingest::types::{Payload, SeismicPayload, SourceConnector, SourceId};

pub const DEFAULT_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";

/// Seismic connector for the USGS GeoJSON summary feed.
pub struct UsgsConnector {
    mode: Mode,
}

impl UsgsConnector {
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

    fn parse(body: &str) -> Result<SeismicPayload, FetchError> {
        let t0 = std::time::Instant::now();
        let mut payload: SeismicPayload = serde_json::from_str(body)?;
        for f in &mut payload.features {
            if let Some(place) = f.properties.place.as_mut() {
                *place = crate::ingest::clean_text(place);
            }
        }
        histogram!("ingest_parse_ms", "source" => "seismic")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(payload)
    }
}

#[async_trait]
impl SourceConnector for UsgsConnector {
    fn source_id(&self) -> SourceId {
        SourceId::Seismic
    }

    async fn fetch_payload(&self) -> Result<Payload, FetchError> {
        let body = self.mode.body().await?;
        Self::parse(&body).map(Payload::Seismic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FetchStatus;

    #[tokio::test]
    async fn parses_features_and_tolerates_null_magnitude() {
        let body = r#"{
            "type": "FeatureCollection",
            "metadata": {"count": 2},
            "features": [
                {"type": "Feature", "properties": {"mag": 4.1, "place": "10 km N of Somewhere", "url": "https://x/1"}},
                {"type": "Feature", "properties": {"mag": null, "place": null}}
            ]
        }"#;
        let res = UsgsConnector::from_fixture(body).fetch().await;
        assert_eq!(res.status, FetchStatus::Ok);
        let Some(Payload::Seismic(p)) = res.payload else {
            panic!("expected seismic payload");
        };
        assert_eq!(p.features.len(), 2);
        assert_eq!(p.features[0].properties.mag, Some(4.1));
        assert_eq!(p.features[1].properties.mag, None);
    }

    #[tokio::test]
    async fn missing_features_key_is_fetch_error() {
        let res = UsgsConnector::from_fixture(r#"{"type":"FeatureCollection"}"#)
            .fetch()
            .await;
        assert_eq!(res.status, FetchStatus::FetchError);
        assert!(res.payload.is_none());
    }

    #[tokio::test]
    async fn empty_feature_list_is_fetch_error() {
        let res = UsgsConnector::from_fixture(r#"{"features":[]}"#).fetch().await;
        assert_eq!(res.status, FetchStatus::FetchError);
    }
}

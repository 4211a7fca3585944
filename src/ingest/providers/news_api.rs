// src/ingest/providers/news_api.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, Url};

use crate::error::FetchError;
use crate::ingest::clean_text;
use crate::ingest::http::Mode;
use crate::ingest::types::{NewsPayload, Payload, SourceConnector, SourceId};

pub const DEFAULT_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_QUERY: &str = "disaster";

/// News-search connector for NewsAPI keyword search.
pub struct NewsApiConnector {
    mode: Option<Mode>,
}

impl NewsApiConnector {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Some(Mode::fixture(s)),
        }
    }

    /// Without an API key the connector stays constructed but every fetch fails.
    pub fn from_url(
        base_url: &str,
        query: &str,
        api_key: Option<&str>,
        client: Client,
    ) -> Result<Self, FetchError> {
        let Some(key) = api_key.filter(|k| !k.trim().is_empty()) else {
            return Ok(Self { mode: None });
        };
        let url = Url::parse_with_params(base_url, &[("q", query), ("apiKey", key)])
            .map_err(|e| FetchError::Config(format!("bad url `{base_url}`: {e}")))?;
        Ok(Self {
            mode: Some(Mode::Http { url, client }),
        })
    }

    fn parse(body: &str) -> Result<NewsPayload, FetchError> {
        let t0 = std::time::Instant::now();
        let mut payload: NewsPayload = serde_json::from_str(body)?;
        for a in &mut payload.articles {
            a.title = clean_text(&a.title);
        }
        histogram!("ingest_parse_ms", "source" => "news_search")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(payload)
    }
}

#[async_trait]
impl SourceConnector for NewsApiConnector {
    fn source_id(&self) -> SourceId {
        SourceId::NewsSearch
    }

    async fn fetch_payload(&self) -> Result<Payload, FetchError> {
        let Some(mode) = &self.mode else {
            return Err(FetchError::Config("NEWS_API_KEY is not set".into()));
        };
        let body = mode.body().await?;
        Self::parse(&body).map(Payload::NewsSearch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FetchStatus;

    #[tokio::test]
    async fn parses_articles() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [
                {"source": {"id": null, "name": "Wire"}, "title": "Disaster relief arrives", "url": "https://news.test/a"}
            ]
        }"#;
        let res = NewsApiConnector::from_fixture(body).fetch().await;
        assert_eq!(res.status, FetchStatus::Ok);
        let Some(Payload::NewsSearch(p)) = res.payload else {
            panic!("expected news payload");
        };
        assert_eq!(p.articles[0].title, "Disaster relief arrives");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_request() {
        let client = crate::ingest::http::build_client(5).unwrap();
        let c = NewsApiConnector::from_url(DEFAULT_URL, DEFAULT_QUERY, None, client).unwrap();
        let err = c.fetch_payload().await.unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
        assert_eq!(c.fetch().await.status, FetchStatus::FetchError);
    }

    #[test]
    fn query_and_key_are_encoded() {
        let client = crate::ingest::http::build_client(5).unwrap();
        let c = NewsApiConnector::from_url(DEFAULT_URL, "flash flood", Some("k&1"), client)
            .unwrap();
        let Some(Mode::Http { url, .. }) = &c.mode else {
            panic!("expected http mode");
        };
        assert_eq!(url.query(), Some("q=flash+flood&apiKey=k%261"));
    }
}

// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod types;

use crate::ingest::types::{SourceConnector, SourceResult};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Records parsed from upstream feeds.");
        describe_counter!(
            "source_fetch_errors_total",
            "Connector fetch/parse/empty failures, by source."
        );
        describe_histogram!("ingest_parse_ms", "Connector parse time in milliseconds.");
    });
}

/// Clean a text field at the connector boundary: decode entities and collapse
/// whitespace. Upstream titles are plain text, so `<` and `>` are kept verbatim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Fetch every connector once, concurrently. Results come back in
/// registration order. A slow or failing connector yields its own `fetch_error`
/// and never holds up its siblings.
pub async fn fetch_all(connectors: &[Box<dyn SourceConnector>]) -> Vec<SourceResult> {
    ensure_metrics_described();

    let results = join_all(connectors.iter().map(|c| c.fetch())).await;
    for res in &results {
        if let Some(p) = &res.payload {
            counter!("ingest_records_total", "source" => res.source_id.as_str())
                .increment(p.len() as u64);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_decodes_and_collapses() {
        let s = "  Red&nbsp;&nbsp;alert:\n Flood   in Area  ";
        assert_eq!(clean_text(s), "Red alert: Flood in Area");
    }

    #[test]
    fn clean_text_keeps_angle_brackets_in_plain_titles() {
        assert_eq!(
            clean_text("Rainfall < 5mm elsewhere, but disaster looms > upstream"),
            "Rainfall < 5mm elsewhere, but disaster looms > upstream"
        );
        assert_eq!(
            clean_text("Disaster: magnitude <6 quake & 'aftershocks' > expected"),
            "Disaster: magnitude <6 quake & 'aftershocks' > expected"
        );
        assert_eq!(
            clean_text("Flood &amp; landslide &lt;Red&gt; in Tonga"),
            "Flood & landslide <Red> in Tonga"
        );
    }

    #[test]
    fn clean_text_keeps_trailing_punctuation() {
        assert_eq!(clean_text("Cyclone warning!"), "Cyclone warning!");
    }
}

// src/snapshot.rs
//! The single persisted "current state" of all sources.
//!
//! On disk the snapshot is one pretty-printed JSON document:
//! `{timestamp, earthquake_data, gdacs_rss_data, reliefweb_data, google_news_data}`,
//! with `null` for a source whose fetch failed. Saves go through a temp file
//! and a rename so readers only ever see a complete document.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt};

use crate::error::StoreError;
use crate::ingest::types::{
    FeedEntry, NewsPayload, Payload, ReportPayload, SeismicPayload, SourceId, SourceResult,
};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/combined_disaster_data.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    results: BTreeMap<SourceId, SourceResult>,
}

impl Snapshot {
    /// Fold connector results into a snapshot. Sources without a result are
    /// recorded as failed, so all four keys are always present.
    pub fn new(timestamp: DateTime<Utc>, results: impl IntoIterator<Item = SourceResult>) -> Self {
        let mut map: BTreeMap<SourceId, SourceResult> = SourceId::ALL
            .iter()
            .map(|&id| (id, SourceResult::failed(id)))
            .collect();
        for r in results {
            map.insert(r.source_id, r);
        }
        Self {
            timestamp,
            results: map,
        }
    }

    /// Results in evaluation order (seismic, disaster feed, humanitarian, news).
    pub fn results(&self) -> impl Iterator<Item = &SourceResult> {
        self.results.values()
    }

    pub fn unavailable(&self) -> Vec<SourceId> {
        self.results
            .values()
            .filter(|r| !r.is_ok())
            .map(|r| r.source_id)
            .collect()
    }

    fn to_document(&self) -> SnapshotDocument {
        let mut doc = SnapshotDocument {
            timestamp: Some(self.timestamp),
            earthquake_data: None,
            gdacs_rss_data: None,
            reliefweb_data: None,
            google_news_data: None,
        };
        for r in self.results.values() {
            match &r.payload {
                Some(Payload::Seismic(p)) => doc.earthquake_data = Some(p.clone()),
                Some(Payload::DisasterFeed(v)) => doc.gdacs_rss_data = Some(v.clone()),
                Some(Payload::HumanitarianReport(p)) => doc.reliefweb_data = Some(p.clone()),
                Some(Payload::NewsSearch(p)) => doc.google_news_data = Some(p.clone()),
                None => {}
            }
        }
        doc
    }

    fn from_document(doc: SnapshotDocument) -> Result<Self, StoreError> {
        let timestamp = doc.timestamp.ok_or(StoreError::Shape("timestamp"))?;
        let results = [
            doc.earthquake_data.map(Payload::Seismic),
            doc.gdacs_rss_data.map(Payload::DisasterFeed),
            doc.reliefweb_data.map(Payload::HumanitarianReport),
            doc.google_news_data.map(Payload::NewsSearch),
        ]
        .into_iter()
        .flatten()
        .map(SourceResult::ok);
        Ok(Self::new(timestamp, results))
    }
}

/// Wire shape shared with the read-only HTTP endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    timestamp: Option<DateTime<Utc>>,
    earthquake_data: Option<SeismicPayload>,
    gdacs_rss_data: Option<Vec<FeedEntry>>,
    reliefweb_data: Option<ReportPayload>,
    google_news_data: Option<NewsPayload>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut s: OsString = self.path.as_os_str().to_owned();
        s.push(".tmp");
        PathBuf::from(s)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Replace the current snapshot. Write-to-temp then rename.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&snapshot.to_document())?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|e| self.io_err(e))?;
        }

        // A partial temp file is never left behind, whichever step fails.
        let tmp = self.tmp_path();
        let written = match write_synced(&tmp, &json).await {
            Ok(()) => fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_err(e));
        }

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    async fn read(&self) -> Result<Vec<u8>, StoreError> {
        match fs::read(&self.path).await {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => Err(self.io_err(e)),
        }
    }

    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        let bytes = self.read().await?;
        let doc: SnapshotDocument = serde_json::from_slice(&bytes)?;
        Snapshot::from_document(doc)
    }

    /// Lenient read for external readers: any missing or `null` source entry
    /// comes back as `{}`.
    pub async fn load_document(&self) -> Result<serde_json::Value, StoreError> {
        let bytes = self.read().await?;
        let mut v: serde_json::Value = serde_json::from_slice(&bytes)?;
        let obj = v.as_object_mut().ok_or(StoreError::Shape("document"))?;
        for id in SourceId::ALL {
            let entry = obj
                .entry(id.document_key())
                .or_insert_with(|| serde_json::json!({}));
            if entry.is_null() {
                *entry = serde_json::json!({});
            }
        }
        Ok(v)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(path).await?;
    f.write_all(bytes).await?;
    f.sync_all().await
}

/// What readers get before the first snapshot exists.
pub fn empty_document() -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("timestamp".into(), serde_json::Value::Null);
    for id in SourceId::ALL {
        obj.insert(id.document_key().into(), serde_json::json!({}));
    }
    serde_json::Value::Object(obj)
}

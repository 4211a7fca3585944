// src/error.rs
//! Error taxonomy for the alert pipeline.
//!
//! Each error type is contained at a different boundary: `FetchError` never
//! leaves a connector, `DeliveryError` never leaves the dispatcher, and
//! `PipelineError` never leaves the scheduler.

use std::path::PathBuf;

use crate::ingest::types::SourceId;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("upstream returned no records")]
    Empty,

    #[error("connector misconfigured: {0}")]
    Config(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

impl From<quick_xml::DeError> for FetchError {
    fn from(e: quick_xml::DeError) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no snapshot has been persisted at {0}")]
    NotFound(PathBuf),

    #[error("snapshot io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("snapshot document is missing or has an invalid `{0}` entry")]
    Shape(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address `{0}`")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("no recipients configured")]
    NoRecipients,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("reading rules from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing rules: {0}")]
    Parse(String),

    #[error("rule `{rule}` has an invalid template: {message}")]
    Template { rule: String, message: String },

    #[error("rule `{rule}` is invalid for source {source_id}: {message}")]
    Invalid {
        rule: String,
        source_id: SourceId,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No alerts are derived from a snapshot that was not persisted.
    #[error("snapshot persistence failed: {0}")]
    Persistence(#[source] StoreError),

    #[error("reloading persisted snapshot failed: {0}")]
    Reload(#[source] StoreError),
}

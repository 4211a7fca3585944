// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod snapshot;

// Connectors: one per upstream feed
pub mod ingest;

// Rule evaluation
pub mod analyze;

// Alert delivery
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{AlertEvent, RuleEngine, RuleSet, Severity};
pub use crate::api::create_router;
pub use crate::ingest::types::{FetchStatus, Payload, SourceConnector, SourceId, SourceResult};
pub use crate::notify::{Dispatcher, MessageTransport, OutboundMessage};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::scheduler::{Scheduler, SchedulerHandle, SchedulerState};
pub use crate::snapshot::{Snapshot, SnapshotStore};

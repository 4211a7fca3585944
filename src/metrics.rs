// src/metrics.rs
//! Prometheus exposition for pipeline, ingest and notification series.

use std::time::Duration;

use axum::{http::header, response::IntoResponse, routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide recorder. A second install in the same process fails.
    pub fn init(run_interval: Duration) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("installing prometheus recorder: {e}"))?;

        describe_gauge!("pipeline_interval_secs", "Configured pause between pipeline runs.");
        gauge!("pipeline_interval_secs").set(run_interval.as_secs_f64());

        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `GET /metrics` in the text exposition format.
    pub fn router(&self) -> Router {
        let m = self.clone();
        Router::new().route(
            "/metrics",
            get(move || async move {
                (
                    [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                    m.render(),
                )
                    .into_response()
            }),
        )
    }
}

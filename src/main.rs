//! Disaster alert service: binary entrypoint.
//! Loads config, starts the scheduler and serves the read-only snapshot endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use disaster_alerts::config::{load_config_default, Secrets};
use disaster_alerts::metrics::Metrics;
use disaster_alerts::{create_router, Pipeline, Scheduler};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("disaster_alerts=info,pipeline=info,alerts=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;
    cfg.validate()?;
    let secrets = Secrets::from_env();
    tracing::info!(
        interval_secs = cfg.scheduler.interval_secs,
        snapshot = %cfg.snapshot.path.display(),
        recipients = cfg.notify.recipients.len(),
        secrets = ?secrets,
        "starting disaster-alerts"
    );

    let interval = Duration::from_secs(cfg.scheduler.interval_secs);
    let metrics = Metrics::init(interval)?;
    let pipeline = Arc::new(Pipeline::from_config(&cfg, &secrets)?);

    if cfg.http.enabled {
        let app = create_router(pipeline.store().clone()).merge(metrics.router());
        let listener = tokio::net::TcpListener::bind(&cfg.http.bind)
            .await
            .with_context(|| format!("binding {}", cfg.http.bind))?;
        tracing::info!(bind = %cfg.http.bind, "read endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "http server exited");
            }
        });
    }

    let scheduler = Scheduler::new(pipeline, interval).spawn();

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutdown requested; waiting for in-flight run");
    scheduler.stop().await.context("scheduler task")?;
    Ok(())
}

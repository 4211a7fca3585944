// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::{Pipeline, RunReport};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Pipeline runs, by outcome.");
        describe_counter!("alerts_emitted_total", "Alert events produced by rules.");
        describe_counter!("notifications_sent_total", "Alerts delivered.");
        describe_counter!("notifications_failed_total", "Alert deliveries that failed.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a run."
        );
    });
}

/// Drives the pipeline: once immediately, then every `interval`. Runs never
/// overlap; a slow run delays the next tick instead of queueing extra runs.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Exactly one pipeline run. Errors are logged, never returned, so a bad
    /// run cannot stop the next one.
    pub async fn tick(&self) -> Option<RunReport> {
        ensure_metrics_described();
        match self.pipeline.run_once().await {
            Ok(report) => {
                counter!("pipeline_runs_total", "outcome" => "ok").increment(1);
                gauge!("pipeline_last_run_ts").set(report.timestamp.timestamp() as f64);
                tracing::info!(
                    target: "pipeline",
                    unavailable = ?report.unavailable,
                    alerts = report.alerts,
                    delivered = report.delivered,
                    failed = report.failed,
                    "pipeline run finished"
                );
                Some(report)
            }
            Err(e) => {
                counter!("pipeline_runs_total", "outcome" => "error").increment(1);
                tracing::error!(target: "pipeline", error = %e, "pipeline run aborted");
                None
            }
        }
    }

    /// Start the loop on the tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                state_tx.send_replace(SchedulerState::Running);
                self.tick().await;
                state_tx.send_replace(SchedulerState::Idle);

                if *stop_rx.borrow() {
                    break;
                }
            }

            state_tx.send_replace(SchedulerState::Stopped);
            tracing::info!(target: "pipeline", "scheduler stopped");
        });

        SchedulerHandle {
            stop_tx,
            state_rx,
            join,
        }
    }
}

/// Dropping the handle also stops the loop once any in-flight run finishes.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SchedulerState>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Request a stop and wait for the loop to exit. An in-flight run completes first.
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.stop_tx.send(true);
        self.join.await
    }
}

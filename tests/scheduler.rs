// tests/scheduler.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use disaster_alerts::{Scheduler, SchedulerState};

const QUAKE: &str = r#"{"features":[{"properties":{"mag":6.2,"place":"Test Bay"}}]}"#;

async fn wait_for(rec: &Recorder, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while rec.count() < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("scheduler did not reach expected run count in time");
}

#[tokio::test]
async fn tick_runs_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Recorder::default();
    let p = Arc::new(pipeline(vec![usgs(QUAKE)], &dir.path().join("s.json"), &rec));
    let s = Scheduler::new(p, Duration::from_secs(3600));

    let report = s.tick().await.expect("run succeeds");
    assert_eq!(report.alerts, 1);
    assert_eq!(rec.count(), 1);
}

#[tokio::test]
async fn failed_run_does_not_prevent_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let rec = Recorder::default();
    let p = Arc::new(pipeline(vec![usgs(QUAKE)], &blocker.join("s.json"), &rec));
    let s = Scheduler::new(p, Duration::from_secs(3600));

    assert!(s.tick().await.is_none());
    assert!(s.tick().await.is_none());
    assert_eq!(rec.count(), 0);
}

#[tokio::test]
async fn first_run_is_immediate_and_stop_cuts_the_wait() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Recorder::default();
    let p = Arc::new(pipeline(vec![usgs(QUAKE)], &dir.path().join("s.json"), &rec));

    let handle = Scheduler::new(p, Duration::from_secs(3600)).spawn();
    wait_for(&rec, 1).await;

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("stop returned while waiting for the next tick")
        .unwrap();
    assert_eq!(rec.count(), 1);
}

#[tokio::test]
async fn repeats_on_interval_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Recorder::default();
    let p = Arc::new(pipeline(vec![usgs(QUAKE)], &dir.path().join("s.json"), &rec));

    let handle = Scheduler::new(p, Duration::from_millis(40)).spawn();
    wait_for(&rec, 3).await;
    assert_ne!(handle.state(), SchedulerState::Stopped);
    handle.stop().await.unwrap();

    let settled = rec.count();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(rec.count(), settled, "no runs after stop");
}

mod common;

use chargesim::session::SessionStatus;
use common::{Call, RecordingCollector, fast_config, spawn, wait_for, wait_for_status};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_updates(collector: &RecordingCollector, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while collector.updates().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for updates");
}

#[tokio::test]
async fn full_session_reports_start_updates_and_end() {
    let collector = Arc::new(RecordingCollector::default());
    let config = fast_config();
    let (handle, task) = spawn(&config, collector.clone());

    handle.start().unwrap();
    let running = wait_for_status(&handle, SessionStatus::Running).await;
    assert_eq!(running.transaction_id.as_deref(), Some("tx-1"));
    assert!(running.start_time.is_some());

    wait_for_updates(&collector, 3).await;
    let mid = handle.view();
    assert!(mid.energy_dispensed_kwh > 0.0);

    handle.stop().unwrap();
    let idle = wait_for_status(&handle, SessionStatus::Idle).await;
    assert_eq!(idle.transaction_id, None);
    assert_eq!(idle.energy_dispensed_kwh, 0.0);
    assert_eq!(idle.elapsed_seconds, 0);
    assert_eq!(idle.physical.soc, config.initial_soc);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let calls = collector.calls();
    assert_eq!(calls[0], Call::Start(0.2));
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Start(_))).count(), 1);

    let updates = collector.updates();
    let mut prev_soc = 0.0;
    for record in &updates {
        assert_eq!(record.sample_time_increment_seconds, 1);
        assert!(record.soc >= prev_soc);
        assert!(record.soc <= config.target_soc / 100.0);
        assert!(record.avg_voltage_v >= config.voltage_min_v);
        assert!(record.avg_voltage_v <= config.voltage_max_v);
        let derived = record.avg_power_w / record.avg_voltage_v;
        assert!((derived - record.avg_current_a).abs() < 0.01);
        prev_soc = record.soc;
    }

    let ends = collector.ends();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].0, "tx-1");
    assert_eq!(ends[0].1.as_ref(), updates.last());

    handle.shutdown().unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn energy_never_decreases_while_running() {
    let collector = Arc::new(RecordingCollector::default());
    let (handle, _task) = spawn(&fast_config(), collector.clone());
    handle.start().unwrap();
    wait_for_status(&handle, SessionStatus::Running).await;

    let mut rx = handle.subscribe();
    let mut last = 0.0;
    for _ in 0..5 {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        let energy = rx.borrow().energy_dispensed_kwh;
        assert!(energy >= last);
        last = energy;
    }
}

#[tokio::test]
async fn repeated_start_opens_one_session() {
    let collector = Arc::new(RecordingCollector::default());
    let (handle, _task) = spawn(&fast_config(), collector.clone());

    handle.start().unwrap();
    handle.start().unwrap();
    wait_for_status(&handle, SessionStatus::Running).await;
    handle.start().unwrap();
    wait_for_updates(&collector, 2).await;

    assert_eq!(
        collector
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Start(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn stop_while_idle_makes_no_calls() {
    let collector = Arc::new(RecordingCollector::default());
    let (handle, task) = spawn(&fast_config(), collector.clone());
    handle.stop().unwrap();
    handle.shutdown().unwrap();
    task.await.unwrap().unwrap();
    assert!(collector.calls().is_empty());
}

#[tokio::test]
async fn start_failure_enters_error_and_can_retry() {
    let collector = Arc::new(RecordingCollector {
        fail_start: true,
        ..RecordingCollector::default()
    });
    let (handle, _task) = spawn(&fast_config(), collector.clone());

    handle.start().unwrap();
    let view = wait_for_status(&handle, SessionStatus::Error).await;
    assert!(view.last_error.unwrap().contains("503"));
    assert_eq!(view.transaction_id, None);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(collector.updates().is_empty());

    handle.start().unwrap();
    wait_for(&handle, |v| {
        v.status == SessionStatus::Error && collector.calls().len() == 2
    })
    .await;
    assert!(collector.ends().is_empty());
}

#[tokio::test]
async fn update_failure_stops_ticking() {
    let collector = Arc::new(RecordingCollector {
        fail_updates: true,
        ..RecordingCollector::default()
    });
    let (handle, _task) = spawn(&fast_config(), collector.clone());

    handle.start().unwrap();
    let view = wait_for_status(&handle, SessionStatus::Error).await;
    assert_eq!(view.transaction_id.as_deref(), Some("tx-1"));
    assert!(view.energy_dispensed_kwh > 0.0);
    assert!(view.last_error.unwrap().contains("500"));

    let sent = collector.updates().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(collector.updates().len(), sent);
    assert_eq!(handle.view().energy_dispensed_kwh, view.energy_dispensed_kwh);

    // Stop is ignored in error; only a new start leaves it
    handle.stop().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.view().status, SessionStatus::Error);
    assert!(collector.ends().is_empty());
}

#[tokio::test]
async fn end_failure_still_returns_to_idle() {
    let collector = Arc::new(RecordingCollector {
        fail_end: true,
        ..RecordingCollector::default()
    });
    let (handle, _task) = spawn(&fast_config(), collector.clone());

    handle.start().unwrap();
    wait_for_status(&handle, SessionStatus::Running).await;
    wait_for_updates(&collector, 1).await;
    handle.stop().unwrap();
    let view = wait_for_status(&handle, SessionStatus::Idle).await;
    assert_eq!(view.last_error, None);
    assert_eq!(collector.ends().len(), 1);
}

#[tokio::test]
async fn shutdown_ends_running_session() {
    let collector = Arc::new(RecordingCollector::default());
    let (handle, task) = spawn(&fast_config(), collector.clone());

    handle.start().unwrap();
    wait_for_status(&handle, SessionStatus::Running).await;
    wait_for_updates(&collector, 1).await;
    handle.shutdown().unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(collector.ends().len(), 1);
    assert!(handle.start().is_err());
}

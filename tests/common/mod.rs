#![allow(dead_code)]

use chargesim::collector::CollectorClient;
use chargesim::config::SimulationConfig;
use chargesim::error::SimError;
use chargesim::session::{SessionStatus, SessionView};
use chargesim::telemetry::TelemetryRecord;
use chargesim::{SessionHandle, SessionMachine};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(f64),
    Update(String, TelemetryRecord),
    End(String, Option<TelemetryRecord>),
}

/// In-memory collector that records every call
#[derive(Default)]
pub struct RecordingCollector {
    pub calls: Mutex<Vec<Call>>,
    pub fail_start: bool,
    pub fail_updates: bool,
    pub fail_end: bool,
}

impl RecordingCollector {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<TelemetryRecord> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(_, r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn ends(&self) -> Vec<(String, Option<TelemetryRecord>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::End(tx, r) => Some((tx, r)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CollectorClient for RecordingCollector {
    async fn start_session(
        &self,
        _started_at: DateTime<Utc>,
        soc_start: f64,
    ) -> chargesim::Result<String> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Start(soc_start));
            calls.len()
        };
        if self.fail_start {
            return Err(SimError::collector("POST /sessions returned 503"));
        }
        Ok(format!("tx-{}", n))
    }

    async fn send_update(
        &self,
        transaction_id: &str,
        record: &TelemetryRecord,
    ) -> chargesim::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Update(transaction_id.to_string(), *record));
        if self.fail_updates {
            return Err(SimError::collector("POST /updates returned 500"));
        }
        Ok(())
    }

    async fn end_session(
        &self,
        transaction_id: &str,
        final_record: Option<&TelemetryRecord>,
    ) -> chargesim::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::End(transaction_id.to_string(), final_record.copied()));
        if self.fail_end {
            return Err(SimError::collector("POST /end returned 502"));
        }
        Ok(())
    }
}

pub fn fast_config() -> SimulationConfig {
    SimulationConfig {
        seed: Some(42),
        sample_interval_ms: 20,
        ..SimulationConfig::default()
    }
}

/// Spawn a machine on the current runtime
pub fn spawn(
    config: &SimulationConfig,
    collector: Arc<RecordingCollector>,
) -> (SessionHandle, tokio::task::JoinHandle<chargesim::Result<()>>) {
    let (machine, handle) = SessionMachine::new(config, collector).unwrap();
    (handle, tokio::spawn(machine.run()))
}

/// Wait until a published view satisfies `pred`
pub async fn wait_for<F>(handle: &SessionHandle, pred: F) -> SessionView
where
    F: FnMut(&SessionView) -> bool,
{
    let mut rx = handle.subscribe();
    let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for session state")
        .expect("session machine exited");
    SessionView::clone(&view)
}

pub async fn wait_for_status(handle: &SessionHandle, status: SessionStatus) -> SessionView {
    wait_for(handle, |v| v.status == status).await
}

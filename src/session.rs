//! Charging session record
//!
//! This module holds the state of the one session a simulator runs at a
//! time: lifecycle status, collector transaction, timing, accumulated energy
//! and the latest physical sample. Transition rules live in the machine.

use crate::telemetry::{EnergyIntegrator, PhysicalState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session; ready to start
    #[default]
    Idle,

    /// Waiting for the collector to open a transaction
    Starting,

    /// Ticking and reporting telemetry
    Running,

    /// Waiting for the collector to acknowledge the end
    Stopping,

    /// Start or update failed; a new start is required
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }

    /// A network call is outstanding for this transition
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// A start request is accepted in this state
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging session state
#[derive(Debug, Clone)]
pub struct ChargingSession {
    pub status: SessionStatus,

    /// Collector transaction, set once the start call succeeded
    pub transaction_id: Option<String>,

    pub start_time: Option<DateTime<Utc>>,

    /// Message of the failure that put the session in `Error`
    pub last_error: Option<String>,

    /// Latest generated sample
    pub physical: PhysicalState,

    energy: EnergyIntegrator,
    initial: PhysicalState,
}

/// Read-only snapshot of a session, as published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub pending: bool,
    pub transaction_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub energy_dispensed_kwh: f64,
    pub physical: PhysicalState,
    pub last_error: Option<String>,
}

impl ChargingSession {
    /// Idle session that resets to `initial`
    pub fn new(initial: PhysicalState) -> Self {
        Self {
            status: SessionStatus::Idle,
            transaction_id: None,
            start_time: None,
            last_error: None,
            physical: initial,
            energy: EnergyIntegrator::new(),
            initial,
        }
    }

    pub fn energy_dispensed_kwh(&self) -> f64 {
        self.energy.total_kwh()
    }

    /// Whole seconds since the collector accepted the session; 0 when not started
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.start_time
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Enter `Starting` from a clean slate, dropping any previous error,
    /// transaction, energy and sample
    pub fn begin_start(&mut self) {
        self.reset();
        self.status = SessionStatus::Starting;
    }

    /// Collector accepted the session: enter `Running` from a clean slate
    pub fn activate(&mut self, transaction_id: String, now: DateTime<Utc>) {
        self.transaction_id = Some(transaction_id);
        self.start_time = Some(now);
        self.energy.reset();
        self.physical = self.initial;
        self.status = SessionStatus::Running;
    }

    /// Record a new sample and integrate its power; returns the energy total
    pub fn apply_sample(&mut self, sample: PhysicalState, interval_seconds: f64) -> f64 {
        self.physical = sample;
        self.energy.add(sample.power_w, interval_seconds)
    }

    /// Enter `Error`. The transaction and the last sample stay visible.
    pub fn fail(&mut self, message: String) {
        self.status = SessionStatus::Error;
        self.last_error = Some(message);
    }

    pub fn begin_stop(&mut self) {
        self.status = SessionStatus::Stopping;
    }

    /// Back to `Idle` with every per-session value at its initial state
    pub fn reset(&mut self) {
        self.status = SessionStatus::Idle;
        self.transaction_id = None;
        self.start_time = None;
        self.last_error = None;
        self.energy.reset();
        self.physical = self.initial;
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        SessionView {
            status: self.status,
            pending: self.status.is_pending(),
            transaction_id: self.transaction_id.clone(),
            start_time: self.start_time,
            elapsed_seconds: self.elapsed_seconds(now),
            energy_dispensed_kwh: self.energy_dispensed_kwh(),
            physical: self.physical,
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn session() -> ChargingSession {
        ChargingSession::new(PhysicalState::initial(&SimulationConfig::default()))
    }

    #[test]
    fn lifecycle_resets_everything() {
        let mut s = session();
        let t0 = Utc::now();
        s.begin_start();
        assert!(s.status.is_pending());
        s.activate("tx-1".to_string(), t0);
        let mut sample = s.physical;
        sample.soc = 21.5;
        sample.power_w = 36_000.0;
        let kwh = s.apply_sample(sample, 1.0);
        assert!((kwh - 0.01).abs() < 1e-12);
        assert_eq!(s.elapsed_seconds(t0 + chrono::Duration::seconds(5)), 5);

        s.begin_stop();
        s.reset();
        assert_eq!(s.status, SessionStatus::Idle);
        assert_eq!(s.transaction_id, None);
        assert_eq!(s.energy_dispensed_kwh(), 0.0);
        assert_eq!(s.elapsed_seconds(Utc::now()), 0);
        assert_eq!(s.physical.soc, 20.0);
    }

    #[test]
    fn failure_keeps_transaction_and_sample() {
        let mut s = session();
        s.begin_start();
        s.activate("tx-2".to_string(), Utc::now());
        let mut sample = s.physical;
        sample.soc = 22.0;
        s.apply_sample(sample, 1.0);
        s.fail("HTTP 500".to_string());
        let v = s.view(Utc::now());
        assert_eq!(v.status, SessionStatus::Error);
        assert!(!v.pending);
        assert_eq!(v.transaction_id.as_deref(), Some("tx-2"));
        assert_eq!(v.physical.soc, 22.0);
        assert_eq!(v.last_error.as_deref(), Some("HTTP 500"));

        s.begin_start();
        assert_eq!(s.status, SessionStatus::Starting);
        assert_eq!(s.last_error, None);
        assert_eq!(s.transaction_id, None);
        assert_eq!(s.energy_dispensed_kwh(), 0.0);
        assert_eq!(s.physical.soc, 20.0);
    }

    #[test]
    fn status_helpers() {
        assert!(SessionStatus::Idle.can_start());
        assert!(SessionStatus::Error.can_start());
        assert!(!SessionStatus::Running.can_start());
        assert!(!SessionStatus::Starting.can_start());
        assert_eq!(SessionStatus::Stopping.to_string(), "stopping");
        assert_eq!(
            serde_json::to_value(SessionStatus::Running).unwrap(),
            serde_json::json!("running")
        );
    }
}

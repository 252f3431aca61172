use super::physical::PhysicalState;
use serde::{Deserialize, Serialize};

/// Round to two decimal places, the precision the collector stores
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One telemetry sample as transmitted to the collector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub sample_time_increment_seconds: u32,
    /// SOC as a fraction in 0..=1
    pub soc: f64,
    pub temp_c: f64,
    pub avg_power_w: f64,
    pub avg_current_a: f64,
    pub avg_voltage_v: f64,
}

impl TelemetryRecord {
    /// Format a physical sample, every numeric field rounded to 2 decimals
    pub fn from_state(state: &PhysicalState, sample_interval_secs: u32) -> Self {
        Self {
            sample_time_increment_seconds: sample_interval_secs,
            soc: round2(state.soc / 100.0),
            temp_c: round2(state.temp_c),
            avg_power_w: round2(state.power_w),
            avg_current_a: round2(state.current_a),
            avg_voltage_v: round2(state.voltage_v),
        }
    }
}

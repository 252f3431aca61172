use crate::config::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Instantaneous simulated charger readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalState {
    /// State of charge in percent (0..=100)
    pub soc: f64,
    pub power_w: f64,
    pub voltage_v: f64,
    /// Always `power_w / voltage_v`
    pub current_a: f64,
    pub temp_c: f64,
}

impl PhysicalState {
    /// Readings before the first sample of a session
    pub fn initial(config: &SimulationConfig) -> Self {
        Self {
            soc: config.initial_soc,
            power_w: 0.0,
            voltage_v: config.initial_voltage_v,
            current_a: 0.0,
            temp_c: config.initial_temp_c,
        }
    }
}

//! Tick-to-tick physical model of a DC fast charge

use super::physical::PhysicalState;
use crate::config::{MIN_VOLTAGE_V, SimulationConfig};
use crate::error::{SimError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// SOC gained per tick, percent
const SOC_STEP_RANGE: std::ops::Range<f64> = 1.0..2.0;

/// Multiplicative noise applied to tapered power
const POWER_NOISE_RANGE: std::ops::Range<f64> = 0.9..1.1;

/// Fraction of rated power available at `soc_pct`.
///
/// 1.0 up to the knee (`taper_start`, normalized SOC), then a linear decline
/// at `steepness` per unit of normalized SOC, never below `floor`.
pub fn power_taper(soc_pct: f64, taper_start: f64, steepness: f64, floor: f64) -> f64 {
    let soc = (soc_pct / 100.0).clamp(0.0, 1.0);
    if soc < taper_start {
        return 1.0;
    }
    (1.0 - (soc - taper_start) * steepness).max(floor)
}

/// Produces the next [`PhysicalState`] from the previous one.
///
/// The only state carried between calls is the random source, so two
/// generators built from the same config and seed yield identical sequences.
#[derive(Debug, Clone)]
pub struct TelemetryGenerator<R = StdRng> {
    target_soc: f64,
    voltage_min_v: f64,
    voltage_max_v: f64,
    max_power_w: f64,
    taper_start_soc: f64,
    taper_steepness: f64,
    min_power_fraction: f64,
    temp_rise_max_c: f64,
    rng: R,
}

impl TelemetryGenerator<StdRng> {
    /// Generator seeded from `config.seed`, or from OS entropy when unset
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> TelemetryGenerator<R> {
    /// Build a generator; rejects configs that would make a sample undefined
    pub fn new(config: &SimulationConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            target_soc: config.target_soc,
            voltage_min_v: config.voltage_min_v,
            voltage_max_v: config.voltage_max_v,
            max_power_w: config.max_power_w,
            taper_start_soc: config.taper_start_soc,
            taper_steepness: config.taper_steepness,
            min_power_fraction: config.min_power_fraction,
            temp_rise_max_c: config.temp_rise_max_c,
            rng,
        })
    }

    pub fn target_soc(&self) -> f64 {
        self.target_soc
    }

    /// Advance the model by one sample
    pub fn next(&mut self, prev: &PhysicalState) -> Result<PhysicalState> {
        let soc = if prev.soc >= self.target_soc {
            prev.soc
        } else {
            (prev.soc + self.rng.gen_range(SOC_STEP_RANGE)).min(self.target_soc)
        };

        let voltage_v = self.rng.gen_range(self.voltage_min_v..self.voltage_max_v);
        if !(voltage_v.is_finite() && voltage_v >= MIN_VOLTAGE_V) {
            return Err(SimError::generator(format!(
                "sampled voltage {} V leaves current undefined",
                voltage_v
            )));
        }

        let taper = power_taper(
            soc,
            self.taper_start_soc,
            self.taper_steepness,
            self.min_power_fraction,
        );
        let power_w = self.max_power_w * taper * self.rng.gen_range(POWER_NOISE_RANGE);
        let current_a = power_w / voltage_v;
        if !current_a.is_finite() {
            return Err(SimError::generator(format!(
                "derived current is not finite ({} W / {} V)",
                power_w, voltage_v
            )));
        }

        let temp_rise = if self.temp_rise_max_c > 0.0 {
            self.rng.gen_range(0.0..self.temp_rise_max_c)
        } else {
            0.0
        };

        Ok(PhysicalState {
            soc,
            power_w,
            voltage_v,
            current_a,
            temp_c: prev.temp_c + temp_rise,
        })
    }
}

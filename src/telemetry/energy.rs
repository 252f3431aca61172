//! Energy accounting from periodic power samples

/// Energy delivered by `power_w` held for `interval_seconds`, in kWh
pub fn energy_increment_kwh(power_w: f64, interval_seconds: f64) -> f64 {
    (power_w / 1000.0) * (interval_seconds / 3600.0)
}

/// Add one sample's worth of energy to a running total
pub fn integrate(energy_kwh: f64, power_w: f64, interval_seconds: f64) -> f64 {
    energy_kwh + energy_increment_kwh(power_w, interval_seconds)
}

/// Running energy total over an unbounded number of samples.
///
/// Uses Kahan-compensated summation: each increment is tiny relative to
/// the total late in a long session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyIntegrator {
    total_kwh: f64,
    compensation: f64,
}

impl EnergyIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one sample and return the new total
    pub fn add(&mut self, power_w: f64, interval_seconds: f64) -> f64 {
        let y = energy_increment_kwh(power_w, interval_seconds) - self.compensation;
        let t = self.total_kwh + y;
        self.compensation = (t - self.total_kwh) - y;
        self.total_kwh = t;
        self.total_kwh
    }

    pub fn total_kwh(&self) -> f64 {
        self.total_kwh
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_formula() {
        // 150 kW for one hour
        assert!((energy_increment_kwh(150_000.0, 3600.0) - 150.0).abs() < 1e-12);
        // 36 kW for one second is 0.01 kWh
        assert!((integrate(1.0, 36_000.0, 1.0) - 1.01).abs() < 1e-12);
    }

    #[test]
    fn constant_power_matches_closed_form() {
        let mut integrator = EnergyIntegrator::new();
        let (p, i, n) = (123_456.0, 1.0, 10_000u32);
        for _ in 0..n {
            integrator.add(p, i);
        }
        let expected = f64::from(n) * (p / 1000.0) * (i / 3600.0);
        assert!((integrator.total_kwh() - expected).abs() < 1e-9);
    }

    #[test]
    fn long_sessions_stay_accurate() {
        let mut integrator = EnergyIntegrator::new();
        let n = 2_000_000u32;
        for _ in 0..n {
            integrator.add(7_000.0, 0.1);
        }
        let expected = f64::from(n) * 7.0 * (0.1 / 3600.0);
        assert!((integrator.total_kwh() - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn reset_zeroes() {
        let mut integrator = EnergyIntegrator::new();
        integrator.add(50_000.0, 1.0);
        assert!(integrator.total_kwh() > 0.0);
        integrator.reset();
        assert_eq!(integrator.total_kwh(), 0.0);
    }
}

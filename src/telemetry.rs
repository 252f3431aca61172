//! Synthetic charging telemetry
//!
//! The physical model is split into a side-effect free generator that maps
//! one [`PhysicalState`] to the next, an energy integrator, and the record
//! format sent to the collector.

pub mod energy;
pub mod generator;
pub mod physical;
pub mod record;

pub use energy::{EnergyIntegrator, energy_increment_kwh, integrate};
pub use generator::{TelemetryGenerator, power_taper};
pub use physical::PhysicalState;
pub use record::{TelemetryRecord, round2};

//! Configuration management for chargesim
//!
//! This module handles loading, validation, and management of the simulator
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{SimError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod defaults;

/// Lowest voltage bound the generator accepts; derived current is undefined below it
pub const MIN_VOLTAGE_V: f64 = 1.0;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote telemetry collector connection
    pub collector: CollectorConfig,

    /// Physical model and tick cadence
    pub simulation: SimulationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP control surface binding
    pub web: WebConfig,
}

/// Remote telemetry collector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Base URL, e.g. `http://localhost:3000/api`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Simulated charger and vehicle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// State of charge at session start (percent)
    pub initial_soc: f64,

    /// SOC ceiling; charging holds here once reached (percent)
    pub target_soc: f64,

    /// Voltage reported before the first tick
    pub initial_voltage_v: f64,

    /// Battery temperature at session start
    pub initial_temp_c: f64,

    /// Lower bound of the uniformly sampled voltage band
    pub voltage_min_v: f64,

    /// Upper bound (exclusive) of the voltage band
    pub voltage_max_v: f64,

    /// Rated maximum charger power in watts
    pub max_power_w: f64,

    /// Normalized SOC (0..1) above which power starts to taper
    pub taper_start_soc: f64,

    /// Taper slope per unit of normalized SOC above the knee
    pub taper_steepness: f64,

    /// Floor of the taper factor as a fraction of rated power
    pub min_power_fraction: f64,

    /// Upper bound (exclusive) of the per-tick temperature rise
    pub temp_rise_max_c: f64,

    /// Tick period in milliseconds
    pub sample_interval_ms: u64,

    /// Optional RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory or file path for rolling log files; empty disables file logging
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the control API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl SimulationConfig {
    /// Tick period as a `Duration`
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Whole seconds between samples as reported to the collector (at least 1)
    pub fn sample_interval_secs(&self) -> u32 {
        let secs = (self.sample_interval_ms as f64 / 1000.0).round() as u32;
        secs.max(1)
    }

    /// Check the voltage band keeps Ohm's law well-defined
    pub fn validate_voltage_band(&self) -> Result<()> {
        if !self.voltage_min_v.is_finite() || !self.voltage_max_v.is_finite() {
            return Err(SimError::validation(
                "simulation.voltage_min_v",
                "Voltage band must be finite",
            ));
        }
        if self.voltage_min_v < MIN_VOLTAGE_V {
            return Err(SimError::validation(
                "simulation.voltage_min_v".to_string(),
                format!(
                    "Voltage band must stay above {} V, got {}",
                    MIN_VOLTAGE_V, self.voltage_min_v
                ),
            ));
        }
        if self.voltage_max_v <= self.voltage_min_v {
            return Err(SimError::validation(
                "simulation.voltage_max_v",
                "Must be greater than voltage_min_v",
            ));
        }
        Ok(())
    }

    /// Validate the physical model and cadence. Every value that reaches the
    /// generator must be finite.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.initial_soc) {
            return Err(SimError::validation(
                "simulation.initial_soc",
                "Must be within 0..=100",
            ));
        }
        if !(self.target_soc > self.initial_soc && self.target_soc <= 100.0) {
            return Err(SimError::validation(
                "simulation.target_soc",
                "Must be above initial_soc and at most 100",
            ));
        }
        self.validate_voltage_band()?;
        if !(self.initial_voltage_v.is_finite() && self.initial_voltage_v >= MIN_VOLTAGE_V) {
            return Err(SimError::validation(
                "simulation.initial_voltage_v",
                "Must be a finite, non-trivial voltage",
            ));
        }
        if !self.initial_temp_c.is_finite() {
            return Err(SimError::validation(
                "simulation.initial_temp_c",
                "Must be finite",
            ));
        }
        if !(self.max_power_w.is_finite() && self.max_power_w > 0.0) {
            return Err(SimError::validation(
                "simulation.max_power_w",
                "Must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.taper_start_soc) {
            return Err(SimError::validation(
                "simulation.taper_start_soc",
                "Must be within 0..=1",
            ));
        }
        if !(self.taper_steepness.is_finite() && self.taper_steepness >= 0.0) {
            return Err(SimError::validation(
                "simulation.taper_steepness",
                "Must be finite and not negative",
            ));
        }
        if !(self.min_power_fraction > 0.0 && self.min_power_fraction <= 1.0) {
            return Err(SimError::validation(
                "simulation.min_power_fraction",
                "Must be within (0, 1]",
            ));
        }
        if !(self.temp_rise_max_c.is_finite() && self.temp_rise_max_c >= 0.0) {
            return Err(SimError::validation(
                "simulation.temp_rise_max_c",
                "Must be finite and not negative",
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(SimError::validation(
                "simulation.sample_interval_ms",
                "Must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first existing default location, then
    /// apply environment overrides and validate
    pub fn load() -> Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(p) = std::env::var("CHARGESIM_CONFIG")
            && !p.trim().is_empty()
        {
            candidates.push(PathBuf::from(p));
        }
        candidates.push(PathBuf::from("chargesim.yaml"));
        candidates.push(PathBuf::from("/etc/chargesim/config.yaml"));

        let mut config = candidates
            .iter()
            .find(|p| p.exists())
            .map(Self::from_file)
            .transpose()?
            .unwrap_or_default();

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `CHARGESIM_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("CHARGESIM_COLLECTOR_URL")
            && !url.trim().is_empty()
        {
            self.collector.base_url = url.trim().to_string();
        }
        if let Ok(ms) = std::env::var("CHARGESIM_SAMPLE_INTERVAL_MS") {
            self.simulation.sample_interval_ms = ms.trim().parse().map_err(|_| {
                SimError::validation(
                    "CHARGESIM_SAMPLE_INTERVAL_MS".to_string(),
                    format!("Not an integer: {}", ms),
                )
            })?;
        }
        if let Ok(level) = std::env::var("CHARGESIM_LOG_LEVEL")
            && !level.trim().is_empty()
        {
            self.logging.level = level.trim().to_string();
        }
        Ok(())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.collector.base_url.trim();
        if url.is_empty() {
            return Err(SimError::validation(
                "collector.base_url",
                "URL cannot be empty",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SimError::validation(
                "collector.base_url",
                "URL must use http or https",
            ));
        }
        if self.collector.timeout_secs == 0 {
            return Err(SimError::validation(
                "collector.timeout_secs",
                "Must be greater than 0",
            ));
        }

        self.simulation.validate()?;

        if self.web.enabled && self.web.port == 0 {
            return Err(SimError::validation("web.port", "Port must be greater than 0"));
        }

        Ok(())
    }
}

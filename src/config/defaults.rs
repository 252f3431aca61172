use super::*;

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_soc: 20.0,
            target_soc: 90.0,
            initial_voltage_v: 400.0,
            initial_temp_c: 25.0,
            voltage_min_v: 380.0,
            voltage_max_v: 420.0,
            max_power_w: 150_000.0,
            taper_start_soc: 0.6,
            taper_steepness: 2.0,
            min_power_fraction: 0.2,
            temp_rise_max_c: 0.1,
            sample_interval_ms: 1000,
            seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

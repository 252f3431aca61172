#![no_main]

use chargesim::config::Config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(config) = serde_yaml::from_str::<Config>(text)
    {
        if config.validate().is_ok() {
            let _ = config.simulation.sample_interval_secs();
            let _ = chargesim::telemetry::TelemetryGenerator::from_config(&config.simulation);
        }
    }
});

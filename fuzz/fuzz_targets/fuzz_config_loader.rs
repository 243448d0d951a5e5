#![no_main]

use libfuzzer_sys::fuzz_target;
use collapse::config::parse_config;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        // Accepted configurations are always usable by the engine
        if let Ok(result) = parse_config(yaml) {
            assert!(result.config.clock.max_dt > 0.0);
            assert!(result.config.particles.flow_capacity > 0);
        }
    }
});

//! Fuzz target: `EdgeConfig::from_json`
//!
//! Any accepted document must also pass `validate()` and yield a usable
//! poll period and topic root.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use hcc_edge::config::EdgeConfig;
use hcc_edge::registry::DEVICE_SLOTS;
use hcc_edge::telemetry::topic;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = EdgeConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(!config.poll_interval().is_zero());
        assert!((1..=DEVICE_SLOTS).contains(&config.max_devices));
        assert!(topic::edge_topic(&config.pub_root).is_ok());
    }
});

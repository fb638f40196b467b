//! Fuzz target: stored config blob decoder
//!
//! Drives `decode_config` with arbitrary bytes, as NVS would hand back
//! after flash corruption, and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything that decodes also passes `SystemConfig::validate`
//! - A decoded config always builds a `MonitorService`
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use cardiolink::adapters::nvs::decode_config;
use cardiolink::app::service::MonitorService;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = decode_config(data) {
        assert!(cfg.validate().is_ok());
        assert!(MonitorService::new(cfg).is_ok());
    }
});

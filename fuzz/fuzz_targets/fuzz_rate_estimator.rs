//! Fuzz target: `RateEstimator`
//!
//! Feeds arbitrary byte streams as little-endian 12-bit samples, with
//! the estimator tunables taken from the first bytes, and verifies:
//! - No panics or arithmetic overflow for any window up to full capacity
//! - bpm is always 0 (invalid) or inside 40..=200
//! - Accepted peaks are strictly more than `min_distance` apart
//!
//! cargo fuzz run fuzz_rate_estimator

#![no_main]

use cardiolink::signal::rate::RateEstimator;
use cardiolink::signal::window::MAX_WINDOW_CAPACITY;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let threshold = u16::from_le_bytes([data[0], data[1]]) & 0x0FFF;
    let min_distance = usize::from(data[2]);
    let period_ms = u32::from(data[3]).max(1);

    let values: Vec<u16> = data[4..]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]) & 0x0FFF)
        .take(MAX_WINDOW_CAPACITY)
        .collect();

    let estimator = RateEstimator::new(threshold, min_distance, period_ms);
    let report = estimator.report(&values);

    let est = report.estimate;
    assert!(!est.valid && est.bpm == 0 || est.valid && (40..=200).contains(&est.bpm));

    let peaks: Vec<usize> = estimator.peaks(&values).collect();
    assert_eq!(peaks.len(), usize::from(report.peak_count));
    for pair in peaks.windows(2) {
        assert!(pair[1] - pair[0] > min_distance);
    }
});

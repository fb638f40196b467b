//! Fixed-threshold R-peak counting rate estimator.
//!
//! ```text
//!   threshold ─ ─ ─ ─ ─ ─ ─ ─╱╲─ ─ ─ ─ ─ ─ ─ ─ ─ ─╱╲─ ─ ─ ─ ─
//!                           ╱  ╲                  ╱  ╲
//!   baseline ─────────────╱    ╲────────────────╱    ╲──────
//!                          ▲ peak   │◀ min_distance ▶│ ▲ peak
//! ```
//!
//! A sample is a candidate peak when it is a strict local maximum and
//! strictly above `baseline + offset`.  Candidates closer than
//! `min_distance` samples to the previously accepted peak are treated as
//! the same QRS complex and dropped.
//!
//! `bpm = round(peaks × 60 / (C × T_sample))`, then clamped to
//! `{0} ∪ [40, 200]`.  The estimator keeps no state between windows and
//! assumes a stable baseline; it does not track drift.

use crate::config::SystemConfig;

use super::window::Window;

/// Below this the window holds too few beats for a plausible reading.
pub const MIN_PLAUSIBLE_BPM: u16 = 40;
/// Estimates above this saturate.
pub const MAX_REPORTED_BPM: u16 = 200;

/// Heart-rate estimate for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartRateEstimate {
    /// Beats per minute; always `0` or within `40..=200`.
    pub bpm: u16,
    /// `false` when no reliable peaks were found (`bpm == 0`).
    pub valid: bool,
}

impl HeartRateEstimate {
    pub const INVALID: Self = Self { bpm: 0, valid: false };
}

/// Intermediate figures behind an estimate, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateReport {
    pub estimate: HeartRateEstimate,
    pub peak_count: u16,
    /// Unclamped rate.
    pub raw_bpm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEstimator {
    threshold: u16,
    min_distance: usize,
    sample_period_ms: u32,
}

impl RateEstimator {
    pub fn new(threshold: u16, min_distance: usize, sample_period_ms: u32) -> Self {
        Self {
            threshold,
            min_distance,
            sample_period_ms,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.threshold(),
            usize::from(config.min_peak_distance),
            config.sample_period_ms,
        )
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Estimate the rate of a full window.
    pub fn estimate(&self, window: &Window) -> HeartRateEstimate {
        self.report(window.values()).estimate
    }

    /// Estimate plus the peak count and unclamped rate it came from.
    pub fn report(&self, values: &[u16]) -> RateReport {
        let peak_count = self.peaks(values).count() as u16;
        let raw_bpm = self.bpm_for(peak_count, values.len());
        RateReport {
            estimate: clamp_bpm(raw_bpm),
            peak_count,
            raw_bpm,
        }
    }

    /// Accepted peak indices, in ascending order.
    pub fn peaks<'a>(&self, values: &'a [u16]) -> Peaks<'a> {
        Peaks {
            values,
            threshold: self.threshold,
            min_distance: self.min_distance,
            next: 1,
            last_accepted: None,
        }
    }

    /// `round(peaks * 60_000 / (samples * T_sample_ms))` in integer math.
    fn bpm_for(&self, peak_count: u16, samples: usize) -> u32 {
        let duration_ms = samples as u64 * u64::from(self.sample_period_ms);
        if duration_ms == 0 {
            return 0;
        }
        let scaled = u64::from(peak_count) * 60_000;
        ((scaled + duration_ms / 2) / duration_ms).min(u64::from(u32::MAX)) as u32
    }
}

fn clamp_bpm(raw_bpm: u32) -> HeartRateEstimate {
    if raw_bpm < u32::from(MIN_PLAUSIBLE_BPM) {
        HeartRateEstimate::INVALID
    } else if raw_bpm > u32::from(MAX_REPORTED_BPM) {
        HeartRateEstimate {
            bpm: MAX_REPORTED_BPM,
            valid: true,
        }
    } else {
        HeartRateEstimate {
            bpm: raw_bpm as u16,
            valid: true,
        }
    }
}

/// Iterator over accepted peak indices (see [`RateEstimator::peaks`]).
pub struct Peaks<'a> {
    values: &'a [u16],
    threshold: u16,
    min_distance: usize,
    next: usize,
    last_accepted: Option<usize>,
}

impl Iterator for Peaks<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next + 1 < self.values.len() {
            let i = self.next;
            self.next += 1;

            let v = self.values[i];
            let is_candidate =
                v > self.values[i - 1] && v > self.values[i + 1] && v > self.threshold;
            if !is_candidate {
                continue;
            }
            let spaced = self
                .last_accepted
                .is_none_or(|last| i - last > self.min_distance);
            if spaced {
                self.last_accepted = Some(i);
                return Some(i);
            }
        }
        None
    }
}

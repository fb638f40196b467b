//! Signal pipeline — samples, the analysis window, and rate estimation.
//!
//! ```text
//!  Sampler ──▶ Sample ──▶ Window[C] ──(full)──▶ RateEstimator ──▶ HeartRateEstimate
//! ```
//!
//! Everything here is pure data and pure functions; the driving loop in
//! [`MonitorService`](crate::app::service::MonitorService) owns the only
//! live [`Window`](window::Window).

pub mod rate;
pub mod window;

/// One ECG reading taken on a sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    /// Raw ADC counts (0 – 4095).  Zero when contact is lost.
    pub raw: u16,
    /// Both electrodes report skin contact.
    pub contact_ok: bool,
    /// Monotonic timestamp of the read (milliseconds since boot).
    pub taken_at_ms: u64,
}

impl Sample {
    pub fn new(raw: u16, taken_at_ms: u64) -> Self {
        Self {
            raw,
            contact_ok: true,
            taken_at_ms,
        }
    }

    /// A reading taken while a lead-off signal was asserted.
    pub fn lead_off(taken_at_ms: u64) -> Self {
        Self {
            raw: 0,
            contact_ok: false,
            taken_at_ms,
        }
    }
}

//! Elapsed-time cadence gates for the cooperative driving loop.
//!
//! The loop spins as fast as the core allows; nothing in it sleeps.  Each
//! tick the [`Scheduler`] compares the monotonic clock against the last
//! time every duty ran and reports which duties are due.
//!
//! ```text
//!   now_ms ──▶ Scheduler::poll ──▶ Duties { sample, diagnostics }
//!                                        │          │
//!                                        ▼          ▼
//!                               Sampler::acquire   DiagnosticReport
//! ```
//!
//! Connectivity is not gated here: it is stepped every tick and spaces its
//! own attempts with its retry budget.

use crate::config::SystemConfig;

/// Periodic gate driven by elapsed time, never by sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_ms: u32,
    last_ms: Option<u64>,
}

impl Cadence {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// True at most once per period.  The first poll is always due.
    ///
    /// Missed periods are not replayed: after a stall the next run happens
    /// once and the phase restarts from `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= u64::from(self.period_ms));
        if due {
            self.last_ms = Some(now_ms);
        }
        due
    }
}

/// Duties that are due on the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duties {
    pub sample: bool,
    pub diagnostics: bool,
}

pub struct Scheduler {
    sample: Cadence,
    diagnostics: Cadence,
}

impl Scheduler {
    pub fn new(sample_period_ms: u32, diagnostic_interval_ms: u32) -> Self {
        Self {
            sample: Cadence::new(sample_period_ms),
            diagnostics: Cadence::new(diagnostic_interval_ms),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.sample_period_ms, config.diagnostic_interval_ms)
    }

    /// Evaluate every cadence against `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Duties {
        Duties {
            sample: self.sample.poll(now_ms),
            diagnostics: self.diagnostics.poll(now_ms),
        }
    }
}

//! Sensor subsystem — the AD8232 driver and the [`Sampler`] that turns
//! one sensor read into one [`Sample`].

pub mod ecg;

use log::debug;

use crate::app::ports::SensorPort;
use crate::signal::Sample;

/// Acquires one [`Sample`] per sampling tick.
///
/// The lead-off check always runs before the analog read.  With an
/// electrode off (or a failed read) the sample comes back with
/// `contact_ok = false` and the ADC is left alone.
#[derive(Debug, Default)]
pub struct Sampler {
    read_errors: u32,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensor reads that failed outright (GPIO or ADC).
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    pub fn acquire(&mut self, port: &mut impl SensorPort, now_ms: u64) -> Sample {
        match port.read_lead_off() {
            Ok(lead_off) if lead_off.any() => return Sample::lead_off(now_ms),
            Ok(_) => {}
            Err(e) => {
                self.read_errors = self.read_errors.saturating_add(1);
                debug!("Sampler: lead-off read failed — {}", e);
                return Sample::lead_off(now_ms);
            }
        }

        match port.read_ecg_raw() {
            Ok(raw) => Sample::new(raw, now_ms),
            Err(e) => {
                self.read_errors = self.read_errors.saturating_add(1);
                debug!("Sampler: ECG read failed — {}", e);
                Sample::lead_off(now_ms)
            }
        }
    }
}

//! Hardware adapter — bridges the ECG front end to the domain port trait.
//!
//! Owns the [`Ad8232`] driver and exposes it through [`SensorPort`].
//! This is the only module in the system that touches the sensor.  On
//! non-espidf targets the driver reads cfg-gated simulation statics.

use embedded_hal::digital::InputPin;

use crate::app::ports::{LeadOff, SensorPort};
use crate::error::SensorError;
use crate::sensors::ecg::Ad8232;

/// Concrete adapter for the AD8232 behind [`SensorPort`].
pub struct HardwareAdapter<LP, LN> {
    front_end: Ad8232<LP, LN>,
}

impl<LP: InputPin, LN: InputPin> HardwareAdapter<LP, LN> {
    pub fn new(front_end: Ad8232<LP, LN>) -> Self {
        Self { front_end }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<LP: InputPin, LN: InputPin> SensorPort for HardwareAdapter<LP, LN> {
    fn read_lead_off(&mut self) -> Result<LeadOff, SensorError> {
        self.front_end.lead_off()
    }

    fn read_ecg_raw(&mut self) -> Result<u16, SensorError> {
        self.front_end.read_raw()
    }
}

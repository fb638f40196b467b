//! AD8232 single-lead ECG front-end driver.
//!
//! The AD8232 exposes one analog output (the conditioned ECG) and two
//! digital lead-off comparators, LO+ and LO−, which go HIGH when the
//! corresponding electrode loses skin contact.
//!
//! ## Dual-target design
//!
//! Lead-off inputs are any `embedded_hal::digital::InputPin`: on ESP-IDF
//! a `GpioLeadPin` reading the configured GPIO, on host a [`SimLeadPin`]
//! backed by a static atomic.  The analog read goes through `hw_init::adc1_read` on
//! ESP-IDF and a static `AtomicU16` on host.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use embedded_hal::digital::{ErrorType, InputPin};

use crate::app::ports::LeadOff;
use crate::error::SensorError;

static SIM_ECG_ADC: AtomicU16 = AtomicU16::new(2048);
static SIM_LO_PLUS: AtomicBool = AtomicBool::new(false);
static SIM_LO_MINUS: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ecg_adc(raw: u16) {
    SIM_ECG_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_lead_off(plus: bool, minus: bool) {
    SIM_LO_PLUS.store(plus, Ordering::Relaxed);
    SIM_LO_MINUS.store(minus, Ordering::Relaxed);
}

/// Which comparator a [`SimLeadPin`] mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    Plus,
    Minus,
}

/// Host-side lead-off input driven by [`sim_set_lead_off`].
#[derive(Debug, Clone, Copy)]
pub struct SimLeadPin(pub Lead);

impl ErrorType for SimLeadPin {
    type Error = Infallible;
}

impl InputPin for SimLeadPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let flag = match self.0 {
            Lead::Plus => &SIM_LO_PLUS,
            Lead::Minus => &SIM_LO_MINUS,
        };
        Ok(flag.load(Ordering::Relaxed))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|h| !h)
    }
}

/// Lead-off input on a GPIO configured by `hw_init`.
#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy)]
pub struct GpioLeadPin(pub i32);

#[cfg(target_os = "espidf")]
impl ErrorType for GpioLeadPin {
    type Error = Infallible;
}

#[cfg(target_os = "espidf")]
impl InputPin for GpioLeadPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(crate::drivers::hw_init::gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|h| !h)
    }
}

pub struct Ad8232<LP, LN> {
    lo_plus: LP,
    lo_minus: LN,
    _adc_channel: u32,
}

impl<LP: InputPin, LN: InputPin> Ad8232<LP, LN> {
    pub fn new(lo_plus: LP, lo_minus: LN, adc_channel: u32) -> Self {
        Self {
            lo_plus,
            lo_minus,
            _adc_channel: adc_channel,
        }
    }

    /// Read both lead-off comparators (HIGH = electrode detached).
    pub fn lead_off(&mut self) -> Result<LeadOff, SensorError> {
        let plus = self.lo_plus.is_high().map_err(|_| SensorError::GpioReadFailed)?;
        let minus = self.lo_minus.is_high().map_err(|_| SensorError::GpioReadFailed)?;
        Ok(LeadOff { plus, minus })
    }

    #[cfg(target_os = "espidf")]
    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(self._adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        Ok(SIM_ECG_ADC.load(Ordering::Relaxed))
    }
}

#[cfg(target_os = "espidf")]
impl Ad8232<GpioLeadPin, GpioLeadPin> {
    /// Front end on the board's fixed pins (see [`crate::pins`]).
    pub fn on_board() -> Self {
        use crate::pins;
        Self::new(
            GpioLeadPin(pins::LO_PLUS_GPIO),
            GpioLeadPin(pins::LO_MINUS_GPIO),
            pins::ECG_ADC_CHANNEL,
        )
    }
}

impl Ad8232<SimLeadPin, SimLeadPin> {
    /// Front end wired to the simulation statics.
    pub fn simulated() -> Self {
        Self::new(
            SimLeadPin(Lead::Plus),
            SimLeadPin(Lead::Minus),
            crate::pins::ECG_ADC_CHANNEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPin(bool);

    impl ErrorType for FixedPin {
        type Error = Infallible;
    }

    impl InputPin for FixedPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[test]
    fn either_comparator_flags_lead_off() {
        let mut fe = Ad8232::new(FixedPin(false), FixedPin(true), 0);
        let lo = fe.lead_off().unwrap();
        assert!(!lo.plus);
        assert!(lo.minus);
        assert!(lo.any());
    }

    #[test]
    fn both_low_means_contact() {
        let mut fe = Ad8232::new(FixedPin(false), FixedPin(false), 0);
        assert!(!fe.lead_off().unwrap().any());
    }
}

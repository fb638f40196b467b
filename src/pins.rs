//! GPIO / peripheral pin assignments for the CardioLink board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// AD8232 ECG front end — analog output (ADC1)
// ---------------------------------------------------------------------------

/// Conditioned ECG output.  GPIO 36 (SENSOR_VP) on the ESP32.
pub const ECG_ADC_GPIO: i32 = 36;
/// ADC1 channel wired to [`ECG_ADC_GPIO`].
pub const ECG_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// AD8232 lead-off comparators — digital inputs
// ---------------------------------------------------------------------------

/// LO+ comparator.  HIGH = right-arm electrode detached.
pub const LO_PLUS_GPIO: i32 = 32;
/// LO− comparator.  HIGH = left-arm electrode detached.
pub const LO_MINUS_GPIO: i32 = 33;

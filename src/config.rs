//! System configuration parameters
//!
//! All tunable parameters for the CardioLink monitor.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::publisher::TOPIC_CAPACITY;
use crate::signal::window::MAX_WINDOW_CAPACITY;

/// Full-scale value of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;

/// Slowest accepted sampling period.
pub const MAX_SAMPLE_PERIOD_MS: u32 = 1000;

/// Longest variable name used in a telemetry topic (`ecg_signal`).
const LONGEST_VARIABLE: usize = 10;

/// WiFi station credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

/// MQTT broker endpoint and account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub broker_host: heapless::String<64>,
    pub broker_port: u16,
    pub client_id: heapless::String<32>,
    /// Account token, sent as the MQTT username.
    pub token: heapless::String<64>,
}

impl Default for SessionCredentials {
    fn default() -> Self {
        Self {
            broker_host: hstr("industrial.api.ubidots.com"),
            broker_port: 1883,
            client_id: hstr("cardiolink-esp32"),
            token: heapless::String::new(),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Minimum interval between two ECG samples (milliseconds)
    pub sample_period_ms: u32,
    /// Samples per analysis window
    pub window_capacity: u16,

    // --- Peak detection ---
    /// Nominal mid-scale of the ADC (raw counts)
    pub adc_baseline: u16,
    /// Minimum prominence above baseline for an R-peak (raw counts)
    pub peak_offset: u16,
    /// Minimum spacing between accepted peaks (samples)
    pub min_peak_distance: u16,

    // --- Connectivity ---
    /// Link attempts per reconnect sequence
    pub max_link_attempts: u8,
    /// Session attempts per reconnect sequence
    pub max_session_attempts: u8,
    /// Fixed delay between attempts within a sequence (milliseconds)
    pub retry_delay_ms: u32,

    // --- Telemetry ---
    /// Topic prefix, e.g. `/v1.6/devices`
    pub topic_namespace: heapless::String<32>,
    /// Device label used as the second topic segment
    pub device_label: heapless::String<32>,
    /// Trailing topic segment, e.g. `lv` (last value)
    pub topic_suffix: heapless::String<8>,
    /// Diagnostic report interval (milliseconds)
    pub diagnostic_interval_ms: u32,

    // --- Credentials ---
    pub link: LinkCredentials,
    pub session: SessionCredentials,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            sample_period_ms: 4,  // 250 Hz
            window_capacity: 200, // 0.8 s per window

            // Peak detection
            adc_baseline: 2048,
            peak_offset: 50,
            min_peak_distance: 25, // 100 ms refractory at 250 Hz

            // Connectivity
            max_link_attempts: 10,
            max_session_attempts: 5,
            retry_delay_ms: 500,

            // Telemetry
            topic_namespace: hstr("/v1.6/devices"),
            device_label: hstr("cardiolink"),
            topic_suffix: hstr("lv"),
            diagnostic_interval_ms: 1000,

            link: LinkCredentials::default(),
            session: SessionCredentials::default(),
        }
    }
}

impl SystemConfig {
    /// Peak detection threshold: `baseline + offset`, saturating at full scale.
    pub fn threshold(&self) -> u16 {
        self.adc_baseline.saturating_add(self.peak_offset).min(ADC_FULL_SCALE)
    }

    /// Nominal duration of one full window, `C * T_sample` (milliseconds).
    pub fn window_duration_ms(&self) -> u64 {
        u64::from(self.window_capacity) * u64::from(self.sample_period_ms)
    }

    /// Beats-per-minute contributed by one peak: `60 / (C * T_sample)`.
    pub fn bpm_multiplier(&self) -> f32 {
        let duration_ms = self.window_duration_ms();
        if duration_ms == 0 {
            return 0.0;
        }
        60_000.0 / duration_ms as f32
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SAMPLE_PERIOD_MS).contains(&self.sample_period_ms) {
            return Err(ConfigError::ValidationFailed("sample_period_ms out of range (1..=1000)"));
        }
        if self.window_capacity < 3 || usize::from(self.window_capacity) > MAX_WINDOW_CAPACITY {
            return Err(ConfigError::ValidationFailed("window_capacity out of range (3..=1024)"));
        }
        if u32::from(self.adc_baseline) + u32::from(self.peak_offset) >= u32::from(ADC_FULL_SCALE) {
            return Err(ConfigError::ValidationFailed("baseline + offset must stay below ADC full scale"));
        }
        if self.min_peak_distance >= self.window_capacity {
            return Err(ConfigError::ValidationFailed("min_peak_distance must be smaller than the window"));
        }
        if self.max_link_attempts == 0 || self.max_session_attempts == 0 {
            return Err(ConfigError::ValidationFailed("retry budgets must allow at least one attempt"));
        }
        if self.diagnostic_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("diagnostic_interval_ms must be > 0"));
        }
        if !is_topic_segment(&self.device_label) {
            return Err(ConfigError::ValidationFailed("device_label must be non-empty and free of / + #"));
        }
        if !is_topic_segment(&self.topic_suffix) {
            return Err(ConfigError::ValidationFailed("topic_suffix must be non-empty and free of / + #"));
        }
        let longest_topic = self.topic_namespace.len()
            + self.device_label.len()
            + LONGEST_VARIABLE
            + self.topic_suffix.len()
            + 3;
        if longest_topic > TOPIC_CAPACITY {
            return Err(ConfigError::ValidationFailed("telemetry topic too long"));
        }
        if self.session.broker_host.is_empty() || self.session.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("broker host/port missing"));
        }
        if !self.link.ssid.is_empty() {
            if !is_printable_ascii(&self.link.ssid) {
                return Err(ConfigError::ValidationFailed("ssid must be printable ASCII"));
            }
            let pw = self.link.password.len();
            if pw != 0 && pw < 8 {
                return Err(ConfigError::ValidationFailed("WPA2 password must be 8-64 bytes"));
            }
        }
        Ok(())
    }
}

fn hstr<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let pushed = out.push_str(s);
    debug_assert!(pushed.is_ok(), "default string {:?} exceeds {} bytes", s, N);
    out
}

pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn is_topic_segment(s: &str) -> bool {
    !s.is_empty() && is_printable_ascii(s) && !s.contains(['/', '+', '#'])
}

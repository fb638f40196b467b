//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (ECG front end, WiFi, MQTT, clock, event sinks,
//! storage) implement these traits.  The
//! [`MonitorService`](super::service::MonitorService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::error::{LinkError, SensorError, SessionError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// State of the two AD8232 lead-off comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeadOff {
    /// LO+ asserted (right-arm electrode detached).
    pub plus: bool,
    /// LO− asserted (left-arm electrode detached).
    pub minus: bool,
}

impl LeadOff {
    pub fn any(self) -> bool {
        self.plus || self.minus
    }
}

/// Read-side port: the domain calls this to obtain ECG data.
pub trait SensorPort {
    /// Sample both lead-off detector outputs.
    fn read_lead_off(&mut self) -> Result<LeadOff, SensorError>;

    /// One analog conversion of the ECG output (raw counts, 0 – 4095).
    fn read_ecg_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

/// Wireless network link, independent of the messaging session above it.
pub trait LinkPort {
    /// One connection attempt.  Must not retry internally.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Polled every tick to detect drops.
    fn is_up(&self) -> bool;

    /// Signal strength while connected.
    fn rssi(&self) -> Option<i8> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Session port (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Authenticated messaging session to the remote collector.
pub trait SessionPort {
    /// One session attempt over an established link.  Must not retry internally.
    fn connect(&mut self) -> Result<(), SessionError>;

    /// Polled every tick to detect drops.
    fn is_connected(&self) -> bool;

    /// Fire-and-forget publish (QoS 0).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used for all cadence decisions.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// test recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST call [`SystemConfig::validate`] before persisting
/// and after loading; invalid values are rejected, not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

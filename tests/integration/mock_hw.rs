//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full
//! interaction history without touching real ADC/GPIO/radio hardware.

use cardiolink::app::events::AppEvent;
use cardiolink::app::ports::{
    ConfigError, ConfigPort, EventSink, LeadOff, LinkPort, SensorPort, SessionPort,
};
use cardiolink::config::SystemConfig;
use cardiolink::error::{LinkError, SensorError, SessionError};
use std::collections::VecDeque;

// ── MockSensor ────────────────────────────────────────────────

/// One scripted front-end reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Contact(u16),
    LeadOff,
    /// Electrodes attached but the ADC read fails.
    AdcError,
}

/// Plays back a script of readings, then repeats `idle`.
pub struct MockSensor {
    pub script: VecDeque<Reading>,
    pub idle: Reading,
    pub adc_reads: u32,
    current: Reading,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new() -> Self {
        Self::constant(2048)
    }

    pub fn constant(raw: u16) -> Self {
        Self {
            script: VecDeque::new(),
            idle: Reading::Contact(raw),
            adc_reads: 0,
            current: Reading::Contact(raw),
        }
    }

    pub fn push_values(&mut self, values: &[u16]) {
        self.script.extend(values.iter().map(|&v| Reading::Contact(v)));
    }

    pub fn push_adc_errors(&mut self, count: usize) {
        self.script.extend(std::iter::repeat(Reading::AdcError).take(count));
    }

    pub fn push_lead_off(&mut self, count: usize) {
        self.script.extend(std::iter::repeat(Reading::LeadOff).take(count));
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockSensor {
    fn read_lead_off(&mut self) -> Result<LeadOff, SensorError> {
        // The lead-off check starts every acquisition; advance the script here.
        self.current = self.script.pop_front().unwrap_or(self.idle);
        Ok(LeadOff {
            plus: self.current == Reading::LeadOff,
            minus: false,
        })
    }

    fn read_ecg_raw(&mut self) -> Result<u16, SensorError> {
        self.adc_reads += 1;
        match self.current {
            Reading::Contact(v) => Ok(v),
            Reading::LeadOff | Reading::AdcError => Err(SensorError::AdcReadFailed),
        }
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub up: bool,
    pub fail_next: u32,
    pub attempts: u32,
}

#[allow(dead_code)]
impl MockLink {
    pub fn failing(times: u32) -> Self {
        Self {
            fail_next: times,
            ..Self::default()
        }
    }
}

impl LinkPort for MockLink {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(LinkError::ConnectionFailed);
        }
        self.up = true;
        Ok(())
    }

    fn is_up(&self) -> bool {
        self.up
    }

    fn rssi(&self) -> Option<i8> {
        self.up.then_some(-58)
    }
}

// ── MockSession ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockSession {
    pub connected: bool,
    pub fail_next: u32,
    pub attempts: u32,
    pub reject_publishes: bool,
    pub published: Vec<(String, String)>,
}

impl SessionPort for MockSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(SessionError::ConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        if self.reject_publishes {
            return Err(SessionError::PublishFailed);
        }
        self.published
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MemConfigStore ────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfigStore {
    pub stored: Option<SystemConfig>,
    pub saves: u32,
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let cfg = self.stored.clone().ok_or(ConfigError::NotFound)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.stored = Some(config.clone());
        self.saves += 1;
        Ok(())
    }
}

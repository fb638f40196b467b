//! Best-effort telemetry publisher.
//!
//! Each cycle sends two tiny JSON documents, `{"value": <n>}`, one for the
//! latest raw ECG sample and one for the latest bpm:
//!
//! ```text
//!   <namespace>/<device-label>/ecg_signal/<suffix>   {"value": 2113}
//!   <namespace>/<device-label>/heart_rate/<suffix>   {"value": 72}
//! ```
//!
//! Without an open session the call is a no-op reporting
//! [`PublishResult::Skipped`].  There is no queue and no retry: this is a
//! live monitor, and stale beats are worthless.

use core::fmt::Write as _;

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::{ConfigError, SessionPort};
use crate::config::SystemConfig;
use crate::connectivity::ConnectionState;
use crate::error::SessionError;
use crate::signal::Sample;
use crate::signal::rate::HeartRateEstimate;

/// Longest topic string the publisher can hold.
pub const TOPIC_CAPACITY: usize = 96;

pub const ECG_SIGNAL_VARIABLE: &str = "ecg_signal";
pub const HEART_RATE_VARIABLE: &str = "heart_rate";

pub type Topic = heapless::String<TOPIC_CAPACITY>;

#[derive(Debug, Serialize)]
struct ValuePayload {
    value: u16,
}

/// Outcome of one [`Publisher::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// No session; nothing was sent.
    Skipped,
    /// Both messages were handed to the transport.
    Delivered,
    /// The transport refused `failed` of the two messages.
    Dropped { failed: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishStats {
    pub delivered: u32,
    pub skipped: u32,
    pub failed_messages: u32,
}

/// Pre-built topic strings, one per published variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub ecg_signal: Topic,
    pub heart_rate: Topic,
}

impl Topics {
    pub fn from_config(config: &SystemConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            ecg_signal: build_topic(config, ECG_SIGNAL_VARIABLE)?,
            heart_rate: build_topic(config, HEART_RATE_VARIABLE)?,
        })
    }
}

fn build_topic(config: &SystemConfig, variable: &str) -> Result<Topic, ConfigError> {
    let mut topic = Topic::new();
    let namespace = config.topic_namespace.trim_end_matches('/');
    let written = if namespace.is_empty() {
        write!(topic, "{}/{}/{}", config.device_label, variable, config.topic_suffix)
    } else {
        write!(
            topic,
            "{}/{}/{}/{}",
            namespace, config.device_label, variable, config.topic_suffix
        )
    };
    written.map_err(|_| ConfigError::ValidationFailed("telemetry topic too long"))?;
    Ok(topic)
}

pub struct Publisher {
    topics: Topics,
    stats: PublishStats,
}

impl Publisher {
    pub fn new(topics: Topics) -> Self {
        Self {
            topics,
            stats: PublishStats::default(),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Topics::from_config(config)?))
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    /// Emit the latest sample and estimate if, and only if, the session is up.
    pub fn publish(
        &mut self,
        session: &mut impl SessionPort,
        sample: Sample,
        estimate: HeartRateEstimate,
        state: ConnectionState,
    ) -> PublishResult {
        if state != ConnectionState::SessionUp {
            self.stats.skipped = self.stats.skipped.saturating_add(1);
            debug!("Publish: skipped ({:?})", state);
            return PublishResult::Skipped;
        }

        let mut failed = 0u8;
        // The second message goes out even if the first one failed.
        if let Err(e) = send_value(session, &self.topics.ecg_signal, sample.raw) {
            warn!("Publish: {} dropped — {}", self.topics.ecg_signal, e);
            failed += 1;
        }
        if let Err(e) = send_value(session, &self.topics.heart_rate, estimate.bpm) {
            warn!("Publish: {} dropped — {}", self.topics.heart_rate, e);
            failed += 1;
        }

        if failed == 0 {
            self.stats.delivered = self.stats.delivered.saturating_add(1);
            PublishResult::Delivered
        } else {
            self.stats.failed_messages = self.stats.failed_messages.saturating_add(u32::from(failed));
            PublishResult::Dropped { failed }
        }
    }
}

fn send_value(session: &mut impl SessionPort, topic: &str, value: u16) -> Result<(), SessionError> {
    let payload = serde_json::to_vec(&ValuePayload { value }).map_err(|_| SessionError::Encode)?;
    session.publish(topic, &payload)
}

//! MQTT session adapter.
//!
//! Implements [`SessionPort`] against the telemetry broker.  The account
//! token is sent as the MQTT username with an empty password; every
//! message goes out at QoS 0 with no retain.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The client connects in the background once created; each
//!   [`SessionPort::connect`] call checks whether the broker has
//!   acknowledged yet, so an attempt never blocks the loop.
//! - **all other targets**: in-memory simulation that records publishes.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::ports::SessionPort;
use crate::config::SessionCredentials;
use crate::error::SessionError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::EspMqttClient;

pub struct MqttAdapter {
    creds: SessionCredentials,
    /// Set by the client callback on CONNACK, cleared on disconnect.
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    /// Simulation: remaining connect attempts to refuse.
    #[cfg(not(target_os = "espidf"))]
    sim_refuse: u32,
    /// Simulation: fail every publish while set.
    #[cfg(not(target_os = "espidf"))]
    sim_publish_fails: bool,
    /// Simulation: every accepted `(topic, payload)`.
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, Vec<u8>)>,
}

impl MqttAdapter {
    pub fn new(creds: SessionCredentials) -> Self {
        Self {
            creds,
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_refuse: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_publish_fails: false,
            #[cfg(not(target_os = "espidf"))]
            sim_published: Vec::new(),
        }
    }

    pub fn credentials(&self) -> &SessionCredentials {
        &self.creds
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        use core::fmt::Write as _;
        use esp_idf_svc::mqtt::client::{EventPayload, MqttClientConfiguration};

        if self.client.is_none() {
            let mut url: heapless::String<96> = heapless::String::new();
            write!(url, "mqtt://{}:{}", self.creds.broker_host, self.creds.broker_port)
                .map_err(|_| SessionError::ConnectFailed)?;
            let conf = MqttClientConfiguration {
                client_id: Some(self.creds.client_id.as_str()),
                username: Some(self.creds.token.as_str()),
                password: Some(""),
                ..Default::default()
            };
            let flag = Arc::clone(&self.connected);
            let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
                EventPayload::Connected(_) => flag.store(true, Ordering::Release),
                EventPayload::Disconnected => flag.store(false, Ordering::Release),
                _ => {}
            })
            .map_err(|e| {
                warn!("MQTT: client init failed — {:?}", e);
                SessionError::ConnectFailed
            })?;
            info!("MQTT: client started for {}", url);
            self.client = Some(client);
        }

        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SessionError::ConnectFailed)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        if self.sim_refuse > 0 {
            self.sim_refuse -= 1;
            warn!("MQTT(sim): broker refused connect");
            return Err(SessionError::ConnectFailed);
        }
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| SessionError::PublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if self.sim_publish_fails {
            return Err(SessionError::PublishFailed);
        }
        self.sim_published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    // ── Simulation controls ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refuse_next(&mut self, attempts: u32) {
        self.sim_refuse = attempts;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_publish_fails(&mut self, fails: bool) {
        self.sim_publish_fails = fails;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_session(&mut self) {
        warn!("MQTT(sim): session dropped");
        self.connected.store(false, Ordering::Release);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim_published
    }
}

impl SessionPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), SessionError> {
        if self.creds.token.is_empty() {
            return Err(SessionError::NoCredentials);
        }
        if self.is_connected() {
            return Ok(());
        }
        debug!(
            "MQTT: connecting to {}:{} as '{}'",
            self.creds.broker_host, self.creds.broker_port, self.creds.client_id
        );
        self.platform_connect()?;
        info!("MQTT: session open");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.platform_publish(topic, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MqttAdapter {
        let mut creds = SessionCredentials::default();
        let _ = creds.token.push_str("BBFF-test-token");
        MqttAdapter::new(creds)
    }

    #[test]
    fn refuses_without_token() {
        let mut m = MqttAdapter::new(SessionCredentials::default());
        assert_eq!(m.connect(), Err(SessionError::NoCredentials));
    }

    #[test]
    fn publish_requires_session() {
        let mut m = adapter();
        assert_eq!(m.publish("t", b"{}"), Err(SessionError::NotConnected));
        m.connect().unwrap();
        m.publish("t", b"{}").unwrap();
        assert_eq!(m.sim_published().len(), 1);
    }

    #[test]
    fn refused_attempts_then_success() {
        let mut m = adapter();
        m.sim_refuse_next(2);
        assert!(m.connect().is_err());
        assert!(m.connect().is_err());
        assert!(m.connect().is_ok());
        assert!(m.is_connected());
    }

    #[test]
    fn drop_clears_connected_flag() {
        let mut m = adapter();
        m.connect().unwrap();
        m.sim_drop_session();
        assert!(!m.is_connected());
    }
}

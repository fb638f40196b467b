//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the wireless half of the connectivity stack.
//! A [`LinkPort::connect`] call never waits for the access point.  The
//! first call starts an association and returns
//! [`LinkError::Associating`]; later calls only check whether the station
//! got an address.  An association still pending after
//! [`ASSOCIATION_POLLS`] checks is started again.  Retry pacing and
//! budgets live in the
//! [`ConnectivityManager`](crate::connectivity::ConnectivityManager).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in its
//!   non-blocking form.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{debug, error, info, warn};

use crate::app::ports::LinkPort;
use crate::config::{LinkCredentials, is_printable_ascii};
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::EspWifi;

/// Checks of a pending association before it is started again.
pub const ASSOCIATION_POLLS: u8 = 10;

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(LinkError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    last_rssi: Option<i8>,
    /// Checks made since the current association started.
    pending_polls: u8,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: counts platform_begin() calls for deterministic failures.
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
    /// Simulation: link reported by the "radio".
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    /// Simulation: checks an association takes before the link comes up.
    #[cfg(not(target_os = "espidf"))]
    sim_latency: u8,
    /// Simulation: checks left on the association in flight, if any.
    #[cfg(not(target_os = "espidf"))]
    sim_pending: Option<u8>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            pending_polls: 0,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            pending_polls: 0,
            sim_connect_counter: 0,
            sim_link_up: false,
            sim_latency: 0,
            sim_pending: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| LinkError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| LinkError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Apply stored credentials.  An empty SSID leaves the adapter unconfigured.
    pub fn apply(&mut self, creds: &LinkCredentials) -> Result<(), LinkError> {
        if creds.ssid.is_empty() {
            return Ok(());
        }
        self.set_credentials(&creds.ssid, &creds.password)
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.pending_polls = 0;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Start an association.  Returns as soon as the request is queued.
    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| LinkError::InvalidSsid)?,
            password: self.password.as_str().try_into().map_err(|_| LinkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        if self.state == WifiState::Connecting {
            if let Err(e) = self.wifi.disconnect() {
                debug!("WiFi: abandoning stalled association — {:?}", e);
            }
        }
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| LinkError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| LinkError::ConnectionFailed)?;
        }
        self.wifi.connect().map_err(|_| LinkError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) {}

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self) -> Result<(), LinkError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        // Every 10th attempt fails to exercise the retry budget.
        if self.sim_connect_counter % 10 == 3 {
            warn!("WiFi(sim): simulated auth failure (attempt {})", self.sim_connect_counter);
            return Err(LinkError::AuthFailed);
        }
        self.sim_pending = Some(self.sim_latency);
        self.platform_poll();
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) {
        match self.sim_pending {
            Some(0) => {
                self.sim_pending = None;
                self.sim_link_up = true;
                info!("WiFi(sim): associated with '{}' (attempt {})", self.ssid, self.sim_connect_counter);
            }
            Some(n) => self.sim_pending = Some(n - 1),
            None => {}
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed — {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
        self.sim_pending = None;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        let err = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (err == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.sim_link_up {
            return None;
        }
        // -66..-55 dBm, drifting with the attempt counter.
        let oscillation = ((self.sim_connect_counter % 12) as i8) - 6;
        Some(-60_i8.saturating_add(oscillation))
    }

    /// Simulation: associations need `polls` further checks before the
    /// link comes up.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_association_latency(&mut self, polls: u8) {
        self.sim_latency = polls;
    }

    /// Simulation: the access point goes away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        warn!("WiFi(sim): link dropped");
        self.sim_link_up = false;
        self.sim_pending = None;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        if self.state == WifiState::Connecting && self.pending_polls < ASSOCIATION_POLLS {
            self.platform_poll();
            self.pending_polls += 1;
        } else if !self.platform_is_connected() {
            info!("WiFi: associating with '{}'", self.ssid);
            if let Err(e) = self.platform_begin() {
                error!("WiFi: association failed: {}", e);
                self.state = WifiState::Failed;
                return Err(e);
            }
            self.state = WifiState::Connecting;
            self.pending_polls = 0;
        }

        if !self.platform_is_connected() {
            debug!("WiFi: association pending ({}/{})", self.pending_polls, ASSOCIATION_POLLS);
            return Err(LinkError::Associating);
        }
        if self.state != WifiState::Connected {
            self.state = WifiState::Connected;
            self.last_rssi = self.platform_rssi();
            info!("WiFi: connected (RSSI={:?})", self.last_rssi);
        }
        Ok(())
    }

    fn is_up(&self) -> bool {
        self.platform_is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        if self.platform_is_connected() {
            self.platform_rssi().or(self.last_rssi)
        } else {
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

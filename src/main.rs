//! CardioLink Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative driving loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (SensorPort)      (EventSink)    (ConfigPort) (ClockPort)     │
//! │  WifiAdapter       MqttAdapter                                 │
//! │  (LinkPort)        (SessionPort)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Scheduler · Sampler · Window · RateEstimator          │    │
//! │  │  ConnectivityManager · Publisher                       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{error, info, warn};

use cardiolink::adapters::hardware::HardwareAdapter;
use cardiolink::adapters::log_sink::LogEventSink;
use cardiolink::adapters::mqtt::MqttAdapter;
use cardiolink::adapters::nvs::NvsAdapter;
use cardiolink::adapters::time::Esp32TimeAdapter;
use cardiolink::adapters::wifi::WifiAdapter;
use cardiolink::app::ports::ClockPort;
use cardiolink::app::service::MonitorService;
use cardiolink::config::SystemConfig;
use cardiolink::drivers::{hw_init, watchdog::Watchdog};
use cardiolink::sensors::ecg::Ad8232;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CardioLink v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {} — halting", e);
        return Err(cardiolink::error::Error::from(e).into());
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load_or_default(),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?);
    if let Err(e) = wifi.apply(&config.link) {
        warn!("WiFi: stored credentials rejected — {}", e);
    }

    let mut mqtt = MqttAdapter::new(config.session.clone());
    let mut hw = HardwareAdapter::new(Ad8232::on_board());
    let mut log_sink = LogEventSink::new();
    let clock = Esp32TimeAdapter::new();
    let mut watchdog = Watchdog::new();

    // ── 5. Construct the monitor ──────────────────────────────
    let mut monitor = match MonitorService::new(config) {
        Ok(m) => m,
        Err(e) => {
            warn!("Stored config rejected ({}), using defaults", e);
            MonitorService::new(SystemConfig::default())?
        }
    };
    monitor.start(&mut log_sink);

    info!("System ready. Entering driving loop.");

    // ── 6. Driving loop ───────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();
        monitor.tick(now_ms, &mut hw, &mut wifi, &mut mqtt, &mut log_sink);
        watchdog.feed();
    }
}

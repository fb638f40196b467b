//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the driving loop of the monitor: sampling cadence,
//! windowing, rate estimation, connectivity supervision and publishing.
//! All interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;

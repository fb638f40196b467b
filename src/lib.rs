//! CardioLink firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connectivity;
pub mod diagnostics;
pub mod error;
pub mod publisher;
pub mod scheduler;
pub mod signal;

pub mod pins;

// Adapters and drivers compile on every target; the hardware paths are
// guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;

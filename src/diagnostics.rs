//! Runtime diagnostics for the serial console.
//!
//! A [`DiagnosticReport`] is assembled by the driving loop on the
//! diagnostic cadence and rendered as one line:
//!
//! ```text
//! t=12.345s ecg=2113 bpm=72 link=up session=up fill=120/200 span=800/803ms win=12 lost=3 err=0 faults=1/0 pub=10/2/0 rssi=-61
//! ```
//!
//! The format is for humans; nothing parses it.

use core::fmt;

use crate::connectivity::{ConnectionState, ConnectivityStats};
use crate::publisher::PublishStats;
use crate::signal::Sample;
use crate::signal::rate::HeartRateEstimate;

/// Sampling-side counters kept by the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorCounters {
    pub samples_accepted: u64,
    pub samples_dropped: u64,
    pub windows_estimated: u32,
    pub lead_off_episodes: u32,
    /// Sensor reads that failed outright (GPIO or ADC).
    pub read_errors: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub uptime_ms: u64,
    pub latest_sample: Option<Sample>,
    pub estimate: HeartRateEstimate,
    pub state: ConnectionState,
    pub window_fill: usize,
    pub window_capacity: usize,
    /// `C * T_sample`, the span the bpm formula assumes.
    pub nominal_span_ms: u64,
    /// Span actually measured over the last estimated window.
    pub measured_span_ms: u64,
    pub rssi: Option<i8>,
    pub counters: MonitorCounters,
    pub connectivity: ConnectivityStats,
    pub publish: PublishStats,
}

fn up_down(up: bool) -> &'static str {
    if up { "up" } else { "down" }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}.{:03}s ", self.uptime_ms / 1000, self.uptime_ms % 1000)?;
        match self.latest_sample {
            Some(s) if s.contact_ok => write!(f, "ecg={} ", s.raw)?,
            Some(_) => write!(f, "ecg=lead-off ")?,
            None => write!(f, "ecg=- ")?,
        }
        if self.estimate.valid {
            write!(f, "bpm={} ", self.estimate.bpm)?;
        } else {
            write!(f, "bpm=- ")?;
        }
        write!(
            f,
            "link={} session={} fill={}/{} span={}/{}ms win={} lost={} err={} faults={}/{} pub={}/{}/{}",
            up_down(self.state.link_up()),
            up_down(self.state.session_up()),
            self.window_fill,
            self.window_capacity,
            self.nominal_span_ms,
            self.measured_span_ms,
            self.counters.windows_estimated,
            self.counters.samples_dropped,
            self.counters.read_errors,
            self.connectivity.link_faults,
            self.connectivity.session_faults,
            self.publish.delivered,
            self.publish.skipped,
            self.publish.failed_messages,
        )?;
        if let Some(rssi) = self.rssi {
            write!(f, " rssi={}", rssi)?;
        }
        Ok(())
    }
}

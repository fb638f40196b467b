//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) and the
//! [`ConnectivityManager`](crate::connectivity::ConnectivityManager) emit
//! these through the [`EventSink`](super::ports::EventSink) port.  Nothing
//! here is contractual telemetry — it is the diagnostic boundary.

use crate::connectivity::ConnectionState;
use crate::diagnostics::DiagnosticReport;
use crate::publisher::PublishResult;
use crate::signal::rate::HeartRateEstimate;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The monitor has started.
    Started,

    /// A lead-off episode began; samples are being discarded.
    SensorFault { at_ms: u64 },

    /// Electrode contact is back after a lead-off episode.
    ContactRestored { dropped: u32 },

    /// A full window was analysed.
    EstimateReady {
        estimate: HeartRateEstimate,
        peaks: u16,
        /// Measured span of the window, for comparison with the nominal `C * T_sample`.
        span_ms: u64,
    },

    /// The connectivity state machine moved.
    ConnectionChanged { from: ConnectionState, to: ConnectionState },

    /// A link sequence used its whole budget without success.
    LinkFault { attempts: u8 },

    /// A session sequence used its whole budget without success.
    SessionFault { attempts: u8 },

    /// Outcome of a publish cycle.
    Published(PublishResult),

    /// Periodic status summary.
    Diagnostic(DiagnosticReport),
}

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Every line carries a fixed tag so the serial console can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::publisher::PublishResult;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | monitor running");
            }
            AppEvent::SensorFault { at_ms } => {
                warn!("SAMPLE | lead-off at t={}ms, discarding samples", at_ms);
            }
            AppEvent::ContactRestored { dropped } => {
                info!("SAMPLE | contact restored after {} dropped samples", dropped);
            }
            AppEvent::EstimateReady { estimate, peaks, span_ms } => {
                if estimate.valid {
                    info!("RATE | bpm={} peaks={} span={}ms", estimate.bpm, peaks, span_ms);
                } else {
                    info!("RATE | no plausible rhythm (peaks={} span={}ms)", peaks, span_ms);
                }
            }
            AppEvent::ConnectionChanged { from, to } => {
                info!("LINK | {:?} -> {:?}", from, to);
            }
            AppEvent::LinkFault { attempts } => {
                warn!("LINK | gave up after {} attempts, new sequence next tick", attempts);
            }
            AppEvent::SessionFault { attempts } => {
                warn!("SESSION | gave up after {} attempts, new sequence next tick", attempts);
            }
            AppEvent::Published(result) => match result {
                PublishResult::Delivered => info!("PUBLISH | delivered"),
                PublishResult::Skipped => info!("PUBLISH | skipped, no session"),
                PublishResult::Dropped { failed } => {
                    warn!("PUBLISH | {} of 2 messages dropped", failed);
                }
            },
            AppEvent::Diagnostic(report) => {
                info!("DIAG | {}", report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectionState;
    use crate::signal::rate::HeartRateEstimate;

    #[test]
    fn every_event_formats_without_panicking() {
        let mut sink = LogEventSink::new();
        let events = [
            AppEvent::Started,
            AppEvent::SensorFault { at_ms: 12 },
            AppEvent::ContactRestored { dropped: 3 },
            AppEvent::EstimateReady {
                estimate: HeartRateEstimate { bpm: 72, valid: true },
                peaks: 1,
                span_ms: 796,
            },
            AppEvent::EstimateReady {
                estimate: HeartRateEstimate::INVALID,
                peaks: 0,
                span_ms: 796,
            },
            AppEvent::ConnectionChanged {
                from: ConnectionState::Disconnected,
                to: ConnectionState::LinkUp,
            },
            AppEvent::LinkFault { attempts: 10 },
            AppEvent::SessionFault { attempts: 5 },
            AppEvent::Published(PublishResult::Delivered),
            AppEvent::Published(PublishResult::Skipped),
            AppEvent::Published(PublishResult::Dropped { failed: 1 }),
        ];
        for event in &events {
            sink.emit(event);
        }
    }
}

//! Monitor service — the cooperative driving loop.
//!
//! [`MonitorService`] owns every piece of mutable monitor state inside a
//! single [`MonitorContext`] and advances sampling, connectivity and
//! publishing once per [`tick`](MonitorService::tick).  All I/O flows
//! through port traits passed in at the call site.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────┐ ──▶ EventSink
//!                 │           MonitorService          │
//!    LinkPort ◀──▶│ Scheduler · Sampler · Window      │
//! SessionPort ◀──▶│ RateEstimator · Connectivity · Pub│
//!                 └──────────────────────────────────┘
//! ```
//!
//! Per tick:
//! 1. Step connectivity once; its state is the snapshot for this tick.
//! 2. If the sample cadence is due, acquire and append.
//! 3. If that append filled the window, estimate, reset, publish.
//! 4. If the diagnostic cadence is due, emit a report.

use log::{debug, info};

use crate::app::ports::{EventSink, LinkPort, SensorPort, SessionPort};
use crate::config::SystemConfig;
use crate::connectivity::{ConnectionState, ConnectivityManager};
use crate::diagnostics::{DiagnosticReport, MonitorCounters};
use crate::error::Result;
use crate::publisher::{PublishResult, Publisher};
use crate::scheduler::Scheduler;
use crate::sensors::Sampler;
use crate::signal::Sample;
use crate::signal::rate::{HeartRateEstimate, RateEstimator};
use crate::signal::window::{PushOutcome, Window};

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Context
// ───────────────────────────────────────────────────────────────

/// All mutable monitor state, owned by the service.
#[derive(Debug)]
pub struct MonitorContext {
    pub window: Window,
    pub latest_sample: Option<Sample>,
    pub latest_estimate: HeartRateEstimate,
    /// Measured span of the last estimated window.
    pub last_window_span_ms: u64,
    /// Connection snapshot taken at the start of the current tick.
    pub connection: ConnectionState,
    /// Start of the current lead-off episode, if one is running.
    pub lead_off_since: Option<u64>,
    pub dropped_in_episode: u32,
    pub counters: MonitorCounters,
}

impl MonitorContext {
    fn new(window_capacity: usize) -> Self {
        Self {
            window: Window::new(window_capacity),
            latest_sample: None,
            latest_estimate: HeartRateEstimate::INVALID,
            last_window_span_ms: 0,
            connection: ConnectionState::Disconnected,
            lead_off_since: None,
            dropped_in_episode: 0,
            counters: MonitorCounters::default(),
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub state: ConnectionState,
    pub sample: Option<Sample>,
    pub estimate: Option<HeartRateEstimate>,
    pub publish: Option<PublishResult>,
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService {
    config: SystemConfig,
    ctx: MonitorContext,
    scheduler: Scheduler,
    sampler: Sampler,
    estimator: RateEstimator,
    connectivity: ConnectivityManager,
    publisher: Publisher,
    boot_ms: Option<u64>,
}

impl MonitorService {
    /// Build the service from a validated configuration.
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ctx: MonitorContext::new(usize::from(config.window_capacity)),
            scheduler: Scheduler::from_config(&config),
            sampler: Sampler::new(),
            estimator: RateEstimator::from_config(&config),
            connectivity: ConnectivityManager::from_config(&config),
            publisher: Publisher::from_config(&config)?,
            boot_ms: None,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "MonitorService: C={} T={}ms threshold={} min_distance={} ({:.1} bpm/peak)",
            self.config.window_capacity,
            self.config.sample_period_ms,
            self.estimator.threshold(),
            self.config.min_peak_distance,
            self.config.bpm_multiplier(),
        );
        sink.emit(&AppEvent::Started);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cooperative cycle.  Never blocks.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl SensorPort,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let boot_ms = *self.boot_ms.get_or_insert(now_ms);

        // 1. Connectivity step; snapshot for the rest of the tick
        let state = self.connectivity.tick(now_ms, link, session, sink);
        self.ctx.connection = state;

        let duties = self.scheduler.poll(now_ms);
        let mut outcome = TickOutcome {
            state,
            ..TickOutcome::default()
        };

        // 2. Sampling
        if duties.sample {
            let sample = self.sampler.acquire(hw, now_ms);
            self.ctx.counters.read_errors = self.sampler.read_errors();
            outcome.sample = Some(sample);
            self.ctx.latest_sample = Some(sample);

            if self.track_contact(sample, sink) {
                // 3. Estimation + publish on a full window
                if self.ctx.window.push(sample) == PushOutcome::Full {
                    let estimate = self.estimate_and_reset(sink);
                    let result = self.publisher.publish(session, sample, estimate, state);
                    sink.emit(&AppEvent::Published(result));
                    outcome.estimate = Some(estimate);
                    outcome.publish = Some(result);
                }
                self.ctx.counters.samples_accepted =
                    self.ctx.counters.samples_accepted.saturating_add(1);
            }
        }

        // 4. Diagnostics
        if duties.diagnostics {
            let report = self.report(now_ms.saturating_sub(boot_ms), link.rssi());
            sink.emit(&AppEvent::Diagnostic(report));
        }

        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.connectivity.state()
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Build a diagnostic snapshot from the current context.
    pub fn report(&self, uptime_ms: u64, rssi: Option<i8>) -> DiagnosticReport {
        DiagnosticReport {
            uptime_ms,
            latest_sample: self.ctx.latest_sample,
            estimate: self.ctx.latest_estimate,
            state: self.connectivity.state(),
            window_fill: self.ctx.window.len(),
            window_capacity: self.ctx.window.capacity(),
            nominal_span_ms: self.config.window_duration_ms(),
            measured_span_ms: self.ctx.last_window_span_ms,
            rssi,
            counters: self.ctx.counters,
            connectivity: self.connectivity.stats(),
            publish: self.publisher.stats(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Track lead-off episodes.  Returns `true` if the sample may enter the window.
    fn track_contact(&mut self, sample: Sample, sink: &mut impl EventSink) -> bool {
        if sample.contact_ok {
            if self.ctx.lead_off_since.take().is_some() {
                let dropped = core::mem::take(&mut self.ctx.dropped_in_episode);
                sink.emit(&AppEvent::ContactRestored { dropped });
            }
            return true;
        }

        self.ctx.counters.samples_dropped = self.ctx.counters.samples_dropped.saturating_add(1);
        self.ctx.dropped_in_episode = self.ctx.dropped_in_episode.saturating_add(1);
        if self.ctx.lead_off_since.is_none() {
            self.ctx.lead_off_since = Some(sample.taken_at_ms);
            self.ctx.counters.lead_off_episodes =
                self.ctx.counters.lead_off_episodes.saturating_add(1);
            sink.emit(&AppEvent::SensorFault {
                at_ms: sample.taken_at_ms,
            });
        }
        false
    }

    /// Estimate the full window and empty it, within the same tick as the
    /// append that filled it.
    fn estimate_and_reset(&mut self, sink: &mut impl EventSink) -> HeartRateEstimate {
        let report = self.estimator.report(self.ctx.window.values());
        let span_ms = self.ctx.window.measured_span_ms();
        self.ctx.window.clear();

        self.ctx.latest_estimate = report.estimate;
        self.ctx.last_window_span_ms = span_ms;
        self.ctx.counters.windows_estimated = self.ctx.counters.windows_estimated.saturating_add(1);
        debug!(
            "Rate: {} peaks, raw {} bpm → {:?}",
            report.peak_count, report.raw_bpm, report.estimate
        );
        sink.emit(&AppEvent::EstimateReady {
            estimate: report.estimate,
            peaks: report.peak_count,
            span_ms,
        });
        report.estimate
    }
}

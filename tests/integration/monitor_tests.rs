//! End-to-end tests for `MonitorService` driven through mock adapters.

use cardiolink::app::events::AppEvent;
use cardiolink::app::ports::ConfigPort;
use cardiolink::app::service::{MonitorService, TickOutcome};
use cardiolink::config::SystemConfig;
use cardiolink::connectivity::ConnectionState;
use cardiolink::publisher::PublishResult;
use cardiolink::signal::rate::HeartRateEstimate;

use super::mock_hw::{MemConfigStore, MockLink, MockSensor, MockSession, RecordingSink};

// ── Rig ───────────────────────────────────────────────────────

struct Rig {
    svc: MonitorService,
    hw: MockSensor,
    link: MockLink,
    session: MockSession,
    sink: RecordingSink,
    now_ms: u64,
    period_ms: u64,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let period_ms = u64::from(config.sample_period_ms);
        let mut svc = MonitorService::new(config).unwrap();
        let mut sink = RecordingSink::default();
        svc.start(&mut sink);
        Self {
            svc,
            hw: MockSensor::new(),
            link: MockLink::default(),
            session: MockSession::default(),
            sink,
            now_ms: 0,
            period_ms,
        }
    }

    fn step(&mut self) -> TickOutcome {
        let out = self.svc.tick(
            self.now_ms,
            &mut self.hw,
            &mut self.link,
            &mut self.session,
            &mut self.sink,
        );
        self.now_ms += self.period_ms;
        out
    }

    fn run(&mut self, ticks: usize) -> Vec<TickOutcome> {
        (0..ticks).map(|_| self.step()).collect()
    }
}

fn scenario_a_window() -> Vec<u16> {
    let mut v = vec![2048u16; 200];
    for i in [10, 60, 110, 160, 190] {
        v[i] = 2200;
    }
    v
}

// ── Estimation + publishing ───────────────────────────────────

#[test]
fn full_window_is_estimated_and_published_in_the_same_tick() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.push_values(&scenario_a_window());

    let outcomes = rig.run(200);
    let last = outcomes[199];

    assert!(outcomes[..199].iter().all(|o| o.estimate.is_none()));
    assert_eq!(last.estimate, Some(HeartRateEstimate { bpm: 200, valid: true }));
    assert_eq!(last.publish, Some(PublishResult::Delivered));
    assert_eq!(rig.svc.context().window.len(), 0, "window resets on the filling tick");

    assert_eq!(
        rig.session.published,
        vec![
            ("/v1.6/devices/cardiolink/ecg_signal/lv".to_string(), r#"{"value":2048}"#.to_string()),
            ("/v1.6/devices/cardiolink/heart_rate/lv".to_string(), r#"{"value":200}"#.to_string()),
        ]
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::EstimateReady { peaks: 5, .. })),
        1
    );
}

#[test]
fn flat_baseline_window_reports_invalid_rate() {
    let mut rig = Rig::new(SystemConfig::default());
    let outcomes = rig.run(200);

    assert_eq!(outcomes[199].estimate, Some(HeartRateEstimate::INVALID));
    assert_eq!(rig.svc.context().latest_estimate, HeartRateEstimate::INVALID);
    assert!(rig.session.published.iter().any(|(t, p)| t.contains("heart_rate") && p == r#"{"value":0}"#));
}

#[test]
fn windows_do_not_overlap() {
    let mut rig = Rig::new(SystemConfig::default());
    let outcomes = rig.run(600);
    let filled: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.estimate.map(|_| i))
        .collect();
    assert_eq!(filled, vec![199, 399, 599]);
    assert_eq!(rig.svc.context().counters.windows_estimated, 3);
}

#[test]
fn published_sample_is_the_one_that_filled_the_window() {
    let mut rig = Rig::new(SystemConfig::default());
    let mut values = vec![2048u16; 200];
    values[199] = 1999;
    rig.hw.push_values(&values);
    rig.run(200);
    assert_eq!(rig.session.published[0].1, r#"{"value":1999}"#);
}

// ── Lead-off handling ─────────────────────────────────────────

#[test]
fn lead_off_samples_are_gaps_not_zeros() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.push_values(&[2048; 50]);
    rig.hw.push_lead_off(3);

    rig.run(50);
    assert_eq!(rig.svc.context().window.len(), 50);
    let reads_before = rig.hw.adc_reads;

    rig.run(3);
    assert_eq!(rig.svc.context().window.len(), 50, "window untouched during lead-off");
    assert_eq!(rig.svc.context().counters.samples_dropped, 3);
    assert_eq!(rig.hw.adc_reads, reads_before, "ADC is not read while leads are off");
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorFault { .. })), 1);

    rig.run(5);
    assert_eq!(rig.svc.context().window.len(), 55);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorFault { .. })), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ContactRestored { dropped: 3 })),
        1
    );
}

#[test]
fn each_lead_off_episode_faults_once() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.push_lead_off(2);
    rig.hw.push_values(&[2048; 4]);
    rig.hw.push_lead_off(5);
    rig.run(20);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorFault { .. })), 2);
    assert_eq!(rig.svc.context().counters.lead_off_episodes, 2);
    assert_eq!(rig.svc.context().counters.samples_dropped, 7);
}

#[test]
fn failed_adc_reads_are_gaps_and_reported() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.push_values(&[2048; 10]);
    rig.hw.push_adc_errors(2);
    rig.run(12);

    let ctx = rig.svc.context();
    assert_eq!(ctx.window.len(), 10);
    assert_eq!(ctx.counters.read_errors, 2);
    let report = rig.svc.report(48, None);
    assert_eq!(report.counters.read_errors, 2);
    assert!(report.to_string().contains("err=2"));
}

// ── Connectivity interplay ────────────────────────────────────

#[test]
fn publish_skipped_while_disconnected() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.link.fail_next = u32::MAX;
    let outcomes = rig.run(200);

    assert_eq!(outcomes[199].state, ConnectionState::Disconnected);
    assert_eq!(outcomes[199].publish, Some(PublishResult::Skipped));
    assert!(rig.session.published.is_empty());
    assert_eq!(rig.session.attempts, 0);
    assert_eq!(rig.svc.publisher().stats().skipped, 1);
}

#[test]
fn sampling_continues_during_reconnects() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.link.fail_next = u32::MAX;
    let outcomes = rig.run(150);
    assert!(outcomes.iter().all(|o| o.sample.is_some()));
    assert_eq!(rig.svc.context().window.len(), 150);
    // 600 ms of retries at a 500 ms spacing.
    assert_eq!(rig.link.attempts, 2);
}

#[test]
fn session_up_follows_link_up_on_a_later_tick() {
    let mut rig = Rig::new(SystemConfig::default());
    let outcomes = rig.run(3);
    assert_eq!(outcomes[0].state, ConnectionState::LinkUp);
    assert_eq!(outcomes[1].state, ConnectionState::SessionUp);
    assert_eq!(outcomes[2].state, ConnectionState::SessionUp);
}

#[test]
fn rejected_publishes_are_counted_not_retried() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.session.reject_publishes = true;
    let outcomes = rig.run(200);
    assert_eq!(outcomes[199].publish, Some(PublishResult::Dropped { failed: 2 }));
    assert_eq!(rig.svc.publisher().stats().failed_messages, 2);
    rig.session.reject_publishes = false;
    rig.run(10);
    assert!(rig.session.published.is_empty());
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn diagnostic_report_on_its_own_cadence() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.run(251); // t = 0 ..= 1000 ms
    let reports: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Diagnostic(r) => Some(*r),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 2);
    let last = reports[1];
    assert_eq!(last.uptime_ms, 1000);
    assert_eq!(last.state, ConnectionState::SessionUp);
    assert_eq!(last.nominal_span_ms, 800);
    assert_eq!(last.measured_span_ms, 796);
    assert_eq!(last.window_fill, 51);
    assert_eq!(last.rssi, Some(-58));
    assert!(last.to_string().contains("bpm=-"));
}

// ── Construction + config ─────────────────────────────────────

#[test]
fn service_rejects_invalid_config() {
    let mut c = SystemConfig::default();
    c.window_capacity = 1;
    assert!(MonitorService::new(c).is_err());
}

#[test]
fn slowest_accepted_timing_reports_without_overflow() {
    let mut c = SystemConfig::default();
    c.window_capacity = 1024;
    c.sample_period_ms = 1000;
    let svc = MonitorService::new(c).unwrap();
    assert_eq!(svc.report(0, None).nominal_span_ms, 1_024_000);

    let mut c = SystemConfig::default();
    c.window_capacity = 1024;
    c.sample_period_ms = 5_000_000;
    assert!(MonitorService::new(c).is_err());
}

#[test]
fn custom_window_changes_rate_scale() {
    let mut c = SystemConfig::default();
    c.window_capacity = 500; // 2 s window
    let mut rig = Rig::new(c);
    let mut v = vec![2048u16; 500];
    for i in [50, 200, 350] {
        v[i] = 2300;
    }
    rig.hw.push_values(&v);
    let outcomes = rig.run(500);
    // 3 beats in 2 s
    assert_eq!(outcomes[499].estimate, Some(HeartRateEstimate { bpm: 90, valid: true }));
}

#[test]
fn stored_config_round_trips_through_port() {
    let mut store = MemConfigStore::default();
    let mut c = SystemConfig::default();
    c.peak_offset = 120;
    store.save(&c).unwrap();
    assert_eq!(store.load().unwrap(), c);

    c.sample_period_ms = 0;
    assert!(store.save(&c).is_err());
    assert_eq!(store.saves, 1);
}

//! ConnectivityManager behaviour against mock link/session adapters,
//! plus the simulated WiFi and MQTT adapters end-to-end.

use cardiolink::adapters::mqtt::MqttAdapter;
use cardiolink::adapters::wifi::WifiAdapter;
use cardiolink::app::events::AppEvent;
use cardiolink::config::SessionCredentials;
use cardiolink::connectivity::{ConnectionState, ConnectivityManager};

use super::mock_hw::{MockLink, MockSession, RecordingSink};

#[test]
fn exhausted_link_budget_restarts_from_attempt_one() {
    let mut cm = ConnectivityManager::new(10, 5, 500);
    let mut link = MockLink::failing(10);
    let mut session = MockSession::default();
    let mut sink = RecordingSink::default();

    let mut now = 0;
    for _ in 0..10 {
        let state = cm.tick(now, &mut link, &mut session, &mut sink);
        assert_eq!(state, ConnectionState::Disconnected);
        now += 500;
    }
    assert_eq!(link.attempts, 10);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LinkFault { attempts: 10 })), 1);
    assert!(cm.active_budget().is_none());

    // Next tick: fresh budget, attempt 1, succeeds.
    let state = cm.tick(now - 499, &mut link, &mut session, &mut sink);
    assert_eq!(state, ConnectionState::LinkUp);
    assert_eq!(link.attempts, 11);
}

#[test]
fn at_most_one_attempt_per_tick() {
    let mut cm = ConnectivityManager::new(3, 3, 0);
    let mut link = MockLink::failing(100);
    let mut session = MockSession::default();
    let mut sink = RecordingSink::default();

    for t in 0..20 {
        cm.tick(t, &mut link, &mut session, &mut sink);
        assert!(link.attempts <= (t + 1) as u32);
    }
    assert_eq!(link.attempts, 20);
    assert!(sink.count(|e| matches!(e, AppEvent::LinkFault { .. })) >= 6);
}

#[test]
fn session_faults_keep_link_up_and_retry_later() {
    let mut cm = ConnectivityManager::new(3, 2, 100);
    let mut link = MockLink::default();
    let mut session = MockSession {
        fail_next: 2,
        ..MockSession::default()
    };
    let mut sink = RecordingSink::default();

    assert_eq!(cm.tick(0, &mut link, &mut session, &mut sink), ConnectionState::LinkUp);
    assert_eq!(cm.tick(1, &mut link, &mut session, &mut sink), ConnectionState::LinkUp);
    assert_eq!(cm.tick(101, &mut link, &mut session, &mut sink), ConnectionState::LinkUp);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SessionFault { attempts: 2 })), 1);
    assert_eq!(cm.tick(102, &mut link, &mut session, &mut sink), ConnectionState::SessionUp);
    assert_eq!(session.attempts, 3);
}

#[test]
fn transitions_are_reported_in_order() {
    let mut cm = ConnectivityManager::new(3, 3, 0);
    let mut link = MockLink::default();
    let mut session = MockSession::default();
    let mut sink = RecordingSink::default();

    cm.tick(0, &mut link, &mut session, &mut sink);
    cm.tick(1, &mut link, &mut session, &mut sink);
    session.connected = false;
    cm.tick(2, &mut link, &mut session, &mut sink);
    link.up = false;
    cm.tick(3, &mut link, &mut session, &mut sink);

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectionChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    use ConnectionState::*;
    assert_eq!(
        changes,
        vec![
            (Disconnected, LinkUp),
            (LinkUp, SessionUp),
            (SessionUp, LinkUp),
            (LinkUp, Disconnected),
        ]
    );
    assert_eq!(cm.stats().drops, 2);
}

#[test]
fn simulated_adapters_reach_session_up() {
    let mut cm = ConnectivityManager::new(10, 5, 0);
    let mut wifi = WifiAdapter::new();
    wifi.set_credentials("ClinicNet", "hunter2hunter2").unwrap();
    let mut creds = SessionCredentials::default();
    let _ = creds.token.push_str("BBFF-token");
    let mut mqtt = MqttAdapter::new(creds);
    mqtt.sim_refuse_next(1);
    let mut sink = RecordingSink::default();

    let states: Vec<_> = (0..4)
        .map(|t| cm.tick(t, &mut wifi, &mut mqtt, &mut sink))
        .collect();
    use ConnectionState::*;
    assert_eq!(states, vec![LinkUp, LinkUp, SessionUp, SessionUp]);

    mqtt.sim_drop_session();
    assert_eq!(cm.tick(4, &mut wifi, &mut mqtt, &mut sink), LinkUp);
    wifi.sim_drop_link();
    assert_eq!(cm.tick(5, &mut wifi, &mut mqtt, &mut sink), Disconnected);
}

#[test]
fn slow_wifi_association_spans_several_ticks() {
    let mut cm = ConnectivityManager::new(10, 5, 0);
    let mut wifi = WifiAdapter::new();
    wifi.set_credentials("ClinicNet", "hunter2hunter2").unwrap();
    wifi.sim_set_association_latency(3);
    let mut mqtt = MqttAdapter::new(SessionCredentials::default());
    let mut sink = RecordingSink::default();

    let states: Vec<_> = (0..5)
        .map(|t| cm.tick(t, &mut wifi, &mut mqtt, &mut sink))
        .collect();
    use ConnectionState::*;
    assert_eq!(states, vec![Disconnected, Disconnected, Disconnected, LinkUp, LinkUp]);
    assert_eq!(cm.stats().link_attempts, 4);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LinkFault { .. })), 0);
}

#[test]
fn missing_wifi_credentials_fault_without_panicking() {
    let mut cm = ConnectivityManager::new(2, 2, 0);
    let mut wifi = WifiAdapter::new();
    let mut mqtt = MqttAdapter::new(SessionCredentials::default());
    let mut sink = RecordingSink::default();

    for t in 0..4 {
        assert_eq!(cm.tick(t, &mut wifi, &mut mqtt, &mut sink), ConnectionState::Disconnected);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LinkFault { attempts: 2 })), 2);
}

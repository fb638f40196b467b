//! Link + session resilience state machine.
//!
//! ```text
//!              link ok                    session ok
//!  ┌──────────────┐ ──────▶ ┌──────────┐ ──────────▶ ┌────────────┐
//!  │ Disconnected │         │  LinkUp  │             │ SessionUp  │
//!  └──────────────┘ ◀────── └──────────┘ ◀────────── └────────────┘
//!         ▲        link drop               session drop     │
//!         └──────────────────── link drop ──────────────────┘
//! ```
//!
//! Every [`ConnectivityManager::tick`] does at most one step: either it
//! notices a drop, or it makes at most one connect attempt for the current
//! state.  Attempts inside a sequence are spaced by a fixed delay measured
//! against the clock, so the driving loop never sleeps here and sampling
//! keeps running during a reconnect.
//!
//! Each sequence draws on its own [`RetryBudget`].  When a budget runs out
//! the fault is reported and the sequence ends; the next tick opens a fresh
//! one from attempt 1.  Nothing here ever gives up permanently.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LinkPort, SessionPort};
use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    LinkUp,
    SessionUp,
}

impl ConnectionState {
    pub fn link_up(self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    pub fn session_up(self) -> bool {
        matches!(self, Self::SessionUp)
    }
}

// ───────────────────────────────────────────────────────────────
// Retry budget
// ───────────────────────────────────────────────────────────────

/// Attempt allowance for one connect sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u8,
    max_attempts: u8,
    delay_ms: u32,
    last_attempt_ms: Option<u64>,
}

impl RetryBudget {
    pub fn new(max_attempts: u8, delay_ms: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            delay_ms,
            last_attempt_ms: None,
        }
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// True when another attempt is allowed at `now_ms`.
    pub fn ready(&self, now_ms: u64) -> bool {
        if self.is_exhausted() {
            return false;
        }
        match self.last_attempt_ms {
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.delay_ms),
            None => true,
        }
    }

    /// Consume one attempt; returns its 1-based number.
    pub fn record_attempt(&mut self, now_ms: u64) -> u8 {
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt_ms = Some(now_ms);
        self.attempts
    }
}

/// The reconnect sequence currently in progress, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sequence {
    Link(RetryBudget),
    Session(RetryBudget),
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityStats {
    pub link_attempts: u32,
    pub session_attempts: u32,
    pub link_faults: u32,
    pub session_faults: u32,
    pub drops: u32,
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

pub struct ConnectivityManager {
    state: ConnectionState,
    sequence: Option<Sequence>,
    max_link_attempts: u8,
    max_session_attempts: u8,
    retry_delay_ms: u32,
    stats: ConnectivityStats,
}

impl ConnectivityManager {
    pub fn new(max_link_attempts: u8, max_session_attempts: u8, retry_delay_ms: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            sequence: None,
            max_link_attempts,
            max_session_attempts,
            retry_delay_ms,
            stats: ConnectivityStats::default(),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.max_link_attempts,
            config.max_session_attempts,
            config.retry_delay_ms,
        )
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> ConnectivityStats {
        self.stats
    }

    /// Budget of the sequence in progress (for diagnostics and tests).
    pub fn active_budget(&self) -> Option<RetryBudget> {
        match self.sequence {
            Some(Sequence::Link(b) | Sequence::Session(b)) => Some(b),
            None => None,
        }
    }

    /// Advance the state machine by at most one step.  Safe to call every
    /// cycle regardless of state.
    pub fn tick(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        sink: &mut impl EventSink,
    ) -> ConnectionState {
        if self.detect_drop(link, session, sink) {
            return self.state;
        }

        match self.state {
            ConnectionState::Disconnected => self.step_link(now_ms, link, sink),
            ConnectionState::LinkUp => self.step_session(now_ms, session, sink),
            ConnectionState::SessionUp => {}
        }
        self.state
    }

    // ── Internal ──────────────────────────────────────────────

    fn detect_drop(
        &mut self,
        link: &impl LinkPort,
        session: &impl SessionPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let next = match self.state {
            ConnectionState::Disconnected => return false,
            _ if !link.is_up() => ConnectionState::Disconnected,
            ConnectionState::SessionUp if !session.is_connected() => ConnectionState::LinkUp,
            _ => return false,
        };
        warn!("Connectivity: {:?} lost, falling back to {:?}", self.state, next);
        self.stats.drops = self.stats.drops.saturating_add(1);
        self.sequence = None;
        self.transition(next, sink);
        true
    }

    fn step_link(&mut self, now_ms: u64, link: &mut impl LinkPort, sink: &mut impl EventSink) {
        let mut budget = match self.sequence {
            Some(Sequence::Link(b)) => b,
            _ => {
                debug!("Connectivity: new link sequence ({} attempts)", self.max_link_attempts);
                RetryBudget::new(self.max_link_attempts, self.retry_delay_ms)
            }
        };
        if !budget.ready(now_ms) {
            self.sequence = Some(Sequence::Link(budget));
            return;
        }

        let attempt = budget.record_attempt(now_ms);
        self.stats.link_attempts = self.stats.link_attempts.saturating_add(1);
        match link.connect() {
            Ok(()) => {
                info!("Connectivity: link up (attempt {}/{})", attempt, budget.max_attempts());
                self.sequence = None;
                self.transition(ConnectionState::LinkUp, sink);
            }
            Err(e) => {
                warn!("Connectivity: link attempt {}/{} failed — {}", attempt, budget.max_attempts(), e);
                if budget.is_exhausted() {
                    self.stats.link_faults = self.stats.link_faults.saturating_add(1);
                    self.sequence = None;
                    sink.emit(&AppEvent::LinkFault { attempts: attempt });
                } else {
                    self.sequence = Some(Sequence::Link(budget));
                }
            }
        }
    }

    fn step_session(
        &mut self,
        now_ms: u64,
        session: &mut impl SessionPort,
        sink: &mut impl EventSink,
    ) {
        let mut budget = match self.sequence {
            Some(Sequence::Session(b)) => b,
            _ => {
                debug!("Connectivity: new session sequence ({} attempts)", self.max_session_attempts);
                RetryBudget::new(self.max_session_attempts, self.retry_delay_ms)
            }
        };
        if !budget.ready(now_ms) {
            self.sequence = Some(Sequence::Session(budget));
            return;
        }

        let attempt = budget.record_attempt(now_ms);
        self.stats.session_attempts = self.stats.session_attempts.saturating_add(1);
        match session.connect() {
            Ok(()) => {
                info!("Connectivity: session up (attempt {}/{})", attempt, budget.max_attempts());
                self.sequence = None;
                self.transition(ConnectionState::SessionUp, sink);
            }
            Err(e) => {
                warn!(
                    "Connectivity: session attempt {}/{} failed — {}",
                    attempt,
                    budget.max_attempts(),
                    e
                );
                if budget.is_exhausted() {
                    self.stats.session_faults = self.stats.session_faults.saturating_add(1);
                    self.sequence = None;
                    sink.emit(&AppEvent::SessionFault { attempts: attempt });
                } else {
                    self.sequence = Some(Sequence::Session(budget));
                }
            }
        }
    }

    fn transition(&mut self, to: ConnectionState, sink: &mut impl EventSink) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        sink.emit(&AppEvent::ConnectionChanged { from, to });
    }
}

//! Consecutive-failure circuit breaker guarding the polling loop.
//!
//! `closed` counts consecutive failures and opens at the threshold. `open`
//! blocks polling until the cooldown elapses, then moves to `half_open`,
//! where the next outcome either closes the breaker or opens it again.
//!
//! A run of receive failures ends at the next successful receive. A run of
//! processing failures only ends when a message is processed.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Encoding used by the `circuit_breaker_state` gauge.
    pub fn as_gauge(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The queue could not be polled.
    Receive,
    /// A received message could not be persisted or deleted.
    Processing,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub threshold: u32,
    pub cooldown: Duration,
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold < 1 {
            return Err(anyhow!("CIRCUIT_BREAKER_THRESHOLD must be at least 1"));
        }
        if self.cooldown.is_zero() {
            return Err(anyhow!("CIRCUIT_BREAKER_COOLDOWN_SECONDS must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub trips: u64,
    pub opened_at: Option<DateTime<Utc>>,
    pub cooldown_remaining_secs: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    trips: u64,
    opened_at: Option<(Instant, DateTime<Utc>)>,
    last_failure: Option<FailureKind>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            trips: 0,
            opened_at: None,
            last_failure: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }

    /// Returns `true` when this failure opened the breaker.
    pub fn record_failure(&mut self, kind: FailureKind) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(kind);

        let should_open = match self.state {
            CircuitState::Closed => self.consecutive_failures >= self.config.threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if should_open {
            self.state = CircuitState::Open;
            self.trips += 1;
            self.opened_at = Some((Instant::now(), Utc::now()));
        }

        should_open
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.last_failure = None;
    }

    /// A receive call answered. Closes the breaker when the latest failure
    /// was a receive error; processing failures are left counting.
    pub fn record_receive_success(&mut self) {
        if self.last_failure == Some(FailureKind::Receive) {
            self.record_success();
        }
    }

    /// Time left before polling may resume. Moves an expired `open` breaker
    /// to `half_open` and returns `None`.
    pub fn remaining_cooldown(&mut self) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }

        let remaining = self.cooldown_left();
        if remaining.is_zero() {
            self.state = CircuitState::HalfOpen;
            return None;
        }

        Some(remaining)
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let cooldown_remaining_secs = if self.state == CircuitState::Open {
            self.cooldown_left().as_secs_f64().ceil() as u64
        } else {
            0
        };

        CircuitBreakerSnapshot {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            trips: self.trips,
            opened_at: self.opened_at.map(|(_, wall)| wall),
            cooldown_remaining_secs,
        }
    }

    fn cooldown_left(&self) -> Duration {
        match self.opened_at {
            Some((opened, _)) => self.config.cooldown.saturating_sub(opened.elapsed()),
            None => Duration::ZERO,
        }
    }
}

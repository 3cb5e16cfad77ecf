//! Per-provider circuit breaker.
//!
//! A portfolio run fans out over many tickers. Once the provider is clearly
//! down, the remaining lookups fail fast with `Unavailable` instead of each
//! one waiting out its own retries.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{ProviderId, SourceError};

/// Breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are refused until the cool-down elapses.
    Open,
    /// One trial call is in flight; its outcome decides the next position
    /// and every other caller is refused meanwhile.
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive upstream failures that open the breaker.
    pub failure_threshold: u32,
    /// Cool-down before a trial is let through.
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Tripwire {
    position: CircuitState,
    failure_streak: u32,
    /// When the breaker opened or the current trial was admitted.
    blocked_since: Option<Instant>,
}

/// Thread-safe breaker shared by every lookup of one adapter.
///
/// Only upstream-health failures count: a retryable [`SourceError`] (5xx,
/// timeouts, rate limits) extends the failure streak, while "not found" and
/// other definitive answers prove the provider is up.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    config: CircuitBreakerConfig,
    tripwire: Mutex<Tripwire>,
}

impl CircuitBreaker {
    pub fn new(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            config,
            tripwire: Mutex::new(Tripwire {
                position: CircuitState::Closed,
                failure_streak: 0,
                blocked_since: None,
            }),
        }
    }

    /// Admit a call or refuse it while the breaker is open or testing upstream.
    ///
    /// After the cool-down exactly one caller is admitted as the half-open
    /// trial. A trial that never reports back is replaced once another
    /// cool-down has passed.
    pub fn acquire(&self) -> Result<(), SourceError> {
        let mut tripwire = self.tripwire();
        if tripwire.position == CircuitState::Closed {
            return Ok(());
        }

        let cooled_down = tripwire
            .blocked_since
            .is_some_and(|since| since.elapsed() >= self.config.cool_down);
        if !cooled_down {
            let position = match tripwire.position {
                CircuitState::HalfOpen => "waiting on a trial call",
                _ => "open",
            };
            return Err(SourceError::unavailable(format!(
                "{} circuit breaker is {position}; skipping upstream call",
                self.provider
            )));
        }

        info!(provider = %self.provider, "circuit breaker admitting trial call");
        tripwire.position = CircuitState::HalfOpen;
        tripwire.blocked_since = Some(Instant::now());
        Ok(())
    }

    /// Feed the outcome of an admitted call back into the breaker.
    pub fn record<T>(&self, outcome: &Result<T, SourceError>) {
        let upstream_failed = matches!(outcome, Err(error) if error.retryable());
        let mut tripwire = self.tripwire();

        if !upstream_failed {
            if tripwire.position != CircuitState::Closed {
                info!(provider = %self.provider, "circuit breaker closed");
            }
            tripwire.position = CircuitState::Closed;
            tripwire.failure_streak = 0;
            tripwire.blocked_since = None;
            return;
        }

        tripwire.failure_streak = tripwire.failure_streak.saturating_add(1);
        let trips = tripwire.position == CircuitState::HalfOpen
            || tripwire.failure_streak >= self.config.failure_threshold;
        if trips && tripwire.position != CircuitState::Open {
            warn!(
                provider = %self.provider,
                failures = tripwire.failure_streak,
                cool_down_ms = u64::try_from(self.config.cool_down.as_millis()).unwrap_or(u64::MAX),
                "circuit breaker opened"
            );
            tripwire.position = CircuitState::Open;
            tripwire.blocked_since = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.tripwire().position
    }

    fn tripwire(&self) -> MutexGuard<'_, Tripwire> {
        self.tripwire
            .lock()
            .expect("circuit breaker lock is not poisoned")
    }
}

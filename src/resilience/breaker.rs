//! Circuit breaker state machine
//!
//! One instance protects exactly one downstream call type; unrelated calls
//! get their own instances. State transitions:
//!
//! ```text
//! CLOSED --threshold consecutive failures--> OPEN
//! OPEN   --recovery timeout elapsed-------> HALF_OPEN (one trial call)
//! HALF_OPEN --trial success--> CLOSED
//! HALF_OPEN --trial failure--> OPEN
//! ```
//!
//! While OPEN, calls are rejected before the protected operation is invoked,
//! and rejections never mutate breaker state. Only one HALF_OPEN trial may be
//! in flight; concurrent callers during the trial are rejected as if OPEN. A
//! trial that is cancelled mid-flight returns the breaker to OPEN.
//!
//! The state lock is a plain mutex that is never held across an await: the
//! breaker acquires a permit, drops the lock, runs the operation, then
//! re-locks to record the outcome.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker parameters
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures in CLOSED before tripping to OPEN
    pub failure_threshold: u32,
    /// Time an OPEN breaker waits before allowing a HALF_OPEN trial
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// Error returned by a breaker-protected call
#[derive(Debug, Error)]
pub enum BreakerError<E: std::error::Error> {
    /// Rejected without invoking the protected operation
    #[error("Circuit is open; call rejected")]
    Open,
    /// The protected operation itself failed
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    trial_in_flight: bool,
}

/// Failure-isolating state machine protecting one downstream call type
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker in the CLOSED state
    pub fn new<S: Into<String>>(name: S, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
        }
    }

    /// Run `op` if the breaker permits it, recording the outcome
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        E: std::error::Error,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut permit = match self.acquire() {
            Some(permit) => permit,
            None => return Err(BreakerError::Open),
        };

        match op().await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(e) => {
                permit.record_failure();
                Err(BreakerError::Inner(e))
            }
        }
    }

    /// Current state, for observation and tests
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Current consecutive-failure count
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().failure_count
    }

    /// Acquire a permit to run the protected operation
    ///
    /// `None` means the call is rejected; rejection does not touch state.
    fn acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => Some(CallPermit::new(self, false)),
            CircuitState::Open => {
                let timeout_elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed() > self.config.recovery_timeout)
                    .unwrap_or(true);
                if timeout_elapsed {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    info!(breaker = %self.name, "Recovery timeout elapsed; allowing trial call");
                    Some(CallPermit::new(self, true))
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    None
                } else {
                    inner.trial_in_flight = true;
                    Some(CallPermit::new(self, true))
                }
            }
        }
    }

    fn on_success(&self, was_trial: bool) {
        let mut inner = self.inner.lock().unwrap();
        if was_trial {
            inner.state = CircuitState::Closed;
            inner.failure_count = 0;
            inner.trial_in_flight = false;
            info!(breaker = %self.name, "Trial call succeeded; circuit closed");
        } else if inner.state == CircuitState::Closed {
            inner.failure_count = 0;
        }
    }

    fn on_failure(&self, was_trial: bool) {
        let mut inner = self.inner.lock().unwrap();
        if was_trial {
            inner.state = CircuitState::Open;
            inner.last_failure = Some(Instant::now());
            inner.trial_in_flight = false;
            warn!(breaker = %self.name, "Trial call failed; circuit re-opened");
            return;
        }

        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());
        if inner.state == CircuitState::Closed && inner.failure_count >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            error!(
                breaker = %self.name,
                failure_count = inner.failure_count,
                "Failure threshold reached; circuit tripped open"
            );
        }
    }

    /// A cancelled trial leaves the circuit OPEN rather than wedging HALF_OPEN
    fn on_trial_abandoned(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
        }
        inner.trial_in_flight = false;
        warn!(breaker = %self.name, "Trial call abandoned; circuit re-opened");
    }
}

/// Permission to run one protected call; restores state if dropped mid-trial
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    is_trial: bool,
    resolved: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, is_trial: bool) -> Self {
        Self {
            breaker,
            is_trial,
            resolved: false,
        }
    }

    fn record_success(&mut self) {
        self.resolved = true;
        self.breaker.on_success(self.is_trial);
    }

    fn record_failure(&mut self) {
        self.resolved = true;
        self.breaker.on_failure(self.is_trial);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.resolved && self.is_trial {
            self.breaker.on_trial_abandoned();
        }
    }
}

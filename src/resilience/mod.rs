//! Failure-handling primitives for agent execution
//!
//! Two composable layers protect each capability call:
//! - [`CircuitBreaker`] — per-capability state machine that sheds load after
//!   repeated failures and probes recovery with a single trial call.
//! - [`RetryPolicy`] — bounded retries with exponential, non-blocking backoff.
//!
//! The orchestrator composes them as `retry(breaker(call))`: every retry
//! attempt goes back through the breaker, and an open-circuit rejection is a
//! cheap failed attempt that never feeds back into breaker state.

mod breaker;
mod retry;

pub use breaker::{BreakerConfig, BreakerError, CircuitBreaker, CircuitState};
pub use retry::RetryPolicy;

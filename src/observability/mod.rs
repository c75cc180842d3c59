//! Observability for the task-routing pipeline
//!
//! Structured logging via the tracing stack. Request-scoped spans carry the
//! request id and capability so concurrent requests stay distinguishable.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};

//! agentpipe - Resilient Task-Routing Pipeline
//!
//! A pipeline that accepts a single natural-language request, screens it for
//! unsafe content, routes it to exactly one pluggable capability handler,
//! executes that handler under failure-tolerant conditions, and verifies the
//! result before returning it.
//!
//! # Overview
//!
//! The pipeline composes five pieces:
//! - **Pattern Guard** - heuristic safe/unsafe classification of free text
//! - **Keyword Router** - deterministic, ordered rule matching to one capability
//! - **Circuit Breaker** - per-capability CLOSED/OPEN/HALF_OPEN load shedding
//! - **Retry Policy** - bounded retries with exponential, non-blocking backoff
//! - **Output Verifier** - re-applies the guard to agent output and redacts
//!
//! Requests flow Guard → Route → Execute(Retry+Breaker) → Verify → Respond.
//! The guard and verifier are stateless; breaker state is per capability and
//! updated under a lock never held across an await; the registry is frozen at
//! startup and read without locking.
//!
//! # Quick Start
//!
//! ```rust
//! use agentpipe::agents::{CapabilityRegistry, ContextBag, EdaAgent, ForecastingAgent};
//! use agentpipe::config::PipelineConfig;
//! use agentpipe::pipeline::Orchestrator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), agentpipe::error::PipelineError> {
//! let registry = CapabilityRegistry::builder()
//!     .register("eda", Arc::new(EdaAgent::new()))
//!     .register("forecast", Arc::new(ForecastingAgent::new()))
//!     .build();
//!
//! let orchestrator = Orchestrator::new(&PipelineConfig::default(), registry);
//! let response = orchestrator.submit("profile usage", ContextBag::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod guard;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod testing;

pub use agents::{Agent, AgentResult, CapabilityRegistry, ContextBag};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use guard::{OutputVerifier, PatternGuard, Verdict, REDACTION_MESSAGE};
pub use pipeline::{HistoryObserver, KeywordRouter, Orchestrator, Request, RoutingDecision};
pub use resilience::{CircuitBreaker, CircuitState, RetryPolicy};

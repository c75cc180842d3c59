//! The routing state machine
//!
//! Composes the guard, router, registry, and resilience layers into one
//! forward-progressing pipeline:
//!
//! ```text
//! Start → Guarding → {Blocked | Routed} → Executing → Verifying → Done
//! ```
//!
//! Exactly one agent executes per request. The execution step wraps the
//! selected agent in `retry(breaker(call))`, where the breaker is dedicated
//! to that capability: an open-circuit rejection counts as a failed attempt
//! for retry accounting but never feeds back into breaker state. Blocked
//! requests skip verification and return the fixed redaction message.

use crate::agents::{AgentResult, CapabilityRegistry, ContextBag};
use crate::config::PipelineConfig;
use crate::error::{sanitize_error_message, PipelineError, PipelineResult};
use crate::guard::{OutputVerifier, PatternGuard, REDACTION_MESSAGE};
use crate::pipeline::history::{History, HistoryObserver};
use crate::pipeline::router::{KeywordRouter, RoutingDecision};
use crate::resilience::{BreakerConfig, BreakerError, CircuitBreaker, RetryPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One request flowing through the pipeline
///
/// Immutable once created and owned solely by the invocation that created it.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Uuid,
    pub query: String,
    pub context: ContextBag,
}

impl Request {
    pub fn new<S: Into<String>>(query: S, context: ContextBag) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            context,
        }
    }
}

/// Pipeline states, in traversal order
///
/// `Blocked` and `Done` are terminal; no state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Guarding,
    Routed,
    Executing,
    Verifying,
    Blocked,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Guarding => "guarding",
            PipelineStage::Routed => "routed",
            PipelineStage::Executing => "executing",
            PipelineStage::Verifying => "verifying",
            PipelineStage::Blocked => "blocked",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Orchestrates one request at a time through guard, routing, execution,
/// and verification
///
/// Shared state is limited to the read-only registry and one circuit breaker
/// per capability; everything else is per-request. An `Orchestrator` is
/// cheaply shareable behind an `Arc` across concurrent requests.
pub struct Orchestrator {
    guard: PatternGuard,
    verifier: OutputVerifier,
    router: KeywordRouter,
    registry: Arc<CapabilityRegistry>,
    retry: RetryPolicy,
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    observer: Option<Arc<dyn HistoryObserver>>,
}

impl Orchestrator {
    /// Build an orchestrator over a frozen registry
    ///
    /// One circuit breaker is created per registered capability; they live
    /// for the process lifetime and are never shared across capabilities.
    pub fn new(config: &PipelineConfig, registry: CapabilityRegistry) -> Self {
        let breaker_config = BreakerConfig {
            failure_threshold: config.resilience.failure_threshold,
            recovery_timeout: config.resilience.recovery_timeout(),
        };
        let breakers = registry
            .capabilities()
            .into_iter()
            .map(|capability| {
                let breaker = Arc::new(CircuitBreaker::new(
                    capability.clone(),
                    breaker_config.clone(),
                ));
                (capability, breaker)
            })
            .collect();

        let retry = RetryPolicy::new(
            config.resilience.max_attempts,
            config.resilience.base_delay(),
            config.resilience.backoff_multiplier,
        );

        Self {
            guard: PatternGuard::new(),
            verifier: OutputVerifier::new(),
            router: KeywordRouter::with_default(config.routing.default_capability.clone()),
            registry: Arc::new(registry),
            retry,
            breakers,
            observer: None,
        }
    }

    /// Replace the stock routing rules
    pub fn with_router(mut self, router: KeywordRouter) -> Self {
        self.router = router;
        self
    }

    /// Attach an observer for history appends (e.g. an audit log)
    pub fn with_observer(mut self, observer: Arc<dyn HistoryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Registered capabilities, for observation
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Breaker protecting a capability, for observation and tests
    pub fn breaker(&self, capability: &str) -> Option<&Arc<CircuitBreaker>> {
        self.breakers.get(capability)
    }

    /// Process one query and return the final (possibly redacted) response
    ///
    /// Callers see either the response text or an error whose
    /// [`user_message`](PipelineError::user_message) is safe to surface.
    pub async fn submit(&self, query: &str, context: ContextBag) -> PipelineResult<String> {
        Self::finalize(self.process(Request::new(query, context)).await)
    }

    /// Like [`submit`](Self::submit), with a wall-clock bound on the whole
    /// pipeline
    ///
    /// The source system had no end-to-end timeout; this closes that gap.
    /// Expiry cancels the request at its current suspension point.
    pub async fn submit_with_deadline(
        &self,
        query: &str,
        context: ContextBag,
        deadline: Duration,
    ) -> PipelineResult<String> {
        match tokio::time::timeout(deadline, self.process(Request::new(query, context))).await {
            Ok(result) => Self::finalize(result),
            Err(_) => Err(PipelineError::DeadlineExceeded),
        }
    }

    /// Blocked requests surface as the fixed redaction response, not an error
    fn finalize(result: PipelineResult<String>) -> PipelineResult<String> {
        match result {
            Err(PipelineError::GuardRejection) => Ok(REDACTION_MESSAGE.to_string()),
            other => other,
        }
    }

    /// Derive the routing decision for a request without executing it
    pub fn routing_decision(&self, query: &str) -> RoutingDecision {
        if self.guard.is_unsafe(query) {
            RoutingDecision::Blocked
        } else {
            RoutingDecision::Capability(self.router.route(query).to_string())
        }
    }

    #[tracing::instrument(
        name = "process_request",
        skip(self, request),
        fields(request_id = %request.id)
    )]
    async fn process(&self, request: Request) -> PipelineResult<String> {
        // Guarding
        debug!(stage = %PipelineStage::Guarding, "Screening query");
        if self.guard.is_unsafe(&request.query) {
            warn!(stage = %PipelineStage::Blocked, "Query rejected by pattern guard");
            return Err(PipelineError::GuardRejection);
        }

        // Routed
        let capability = self.router.route(&request.query).to_string();
        debug!(stage = %PipelineStage::Routed, capability = %capability, "Capability selected");
        let agent = self
            .registry
            .get(&capability)
            .ok_or_else(|| PipelineError::UnknownCapability {
                name: capability.clone(),
            })?;
        let breaker = self
            .breakers
            .get(&capability)
            .ok_or_else(|| {
                PipelineError::internal_error(format!("no breaker for capability '{capability}'"))
            })?
            .clone();

        // Executing
        debug!(stage = %PipelineStage::Executing, capability = %capability, "Invoking agent");
        let result = self
            .execute_with_resilience(&request, &capability, agent, breaker)
            .await?;

        let mut history = History::new();
        history.push(result.clone());
        if let Some(observer) = &self.observer {
            observer.on_history_appended(history.as_slice());
        }

        if result.is_soft_failure() {
            warn!(
                agent_id = %result.agent_id,
                "Agent reported a soft failure"
            );
        }

        // Verifying
        debug!(stage = %PipelineStage::Verifying, "Verifying agent output");
        let verification = self.verifier.verify(&result.content);
        if !verification.is_verified {
            warn!(
                agent_id = %result.agent_id,
                confidence = verification.confidence,
                "Agent output flagged; substituting redaction message"
            );
        }

        info!(
            stage = %PipelineStage::Done,
            capability = %capability,
            verified = verification.is_verified,
            "Request complete"
        );
        Ok(verification.sanitized_content)
    }

    /// Run the agent through retry-wrapped, breaker-protected execution
    ///
    /// Only transient errors (unexpected agent failures and open-circuit
    /// rejections) are retried; anything else fails immediately.
    async fn execute_with_resilience(
        &self,
        request: &Request,
        capability: &str,
        agent: Arc<dyn crate::agents::Agent>,
        breaker: Arc<CircuitBreaker>,
    ) -> PipelineResult<AgentResult> {
        let query = request.query.as_str();
        let context = &request.context;

        self.retry
            .run_if(
                || {
                    let agent = Arc::clone(&agent);
                    let breaker = Arc::clone(&breaker);
                    async move {
                        breaker
                            .call(|| agent.execute(query, context))
                            .await
                            .map_err(|e| match e {
                                BreakerError::Open => PipelineError::CircuitOpen {
                                    capability: capability.to_string(),
                                },
                                BreakerError::Inner(inner) => inner,
                            })
                    }
                },
                PipelineError::is_transient,
            )
            .await
            .map_err(|e| {
                if e.is_transient() {
                    PipelineError::RetryExhausted {
                        attempts: self.retry.max_attempts(),
                        message: sanitize_error_message(&e.to_string()),
                    }
                } else {
                    e
                }
            })
    }
}

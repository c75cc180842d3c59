//! Capability contract and built-in agents
//!
//! An agent is a routable capability behind one fixed interface: it receives
//! the query and an opaque context bag and returns an [`AgentResult`]. The
//! pipeline never knows how an agent computes its answer.
//!
//! Expected "no data" conditions are **soft failures**: the agent returns
//! `Ok` with `confidence == 0.0` and an explanatory message. `Err` is
//! reserved for unexpected execution failures, which the orchestrator treats
//! as transient and retries.

mod eda;
mod forecasting;
mod registry;

pub use eda::EdaAgent;
pub use forecasting::ForecastingAgent;
pub use registry::{CapabilityRegistry, RegistryBuilder};

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque key-value bag carried alongside each query
pub type ContextBag = HashMap<String, serde_json::Value>;

/// Structured output of one capability execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResult {
    /// Identifier of the agent that produced this result
    pub agent_id: String,
    /// Textual answer, subject to output verification
    pub content: String,
    /// Agent-specific detail for audit consumers
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Confidence in [0, 1]; 0.0 marks a soft failure
    pub confidence: f64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AgentResult {
    /// Create a successful result
    pub fn new<A: Into<String>, C: Into<String>>(agent_id: A, content: C, confidence: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            confidence: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }

    /// Builder method to attach metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Create a soft failure: the agent cannot produce a result and says why
    pub fn soft_failure<A: Into<String>, C: Into<String>>(agent_id: A, message: C) -> Self {
        Self::new(agent_id, message, 0.0)
    }

    /// Whether this result is a soft failure
    pub fn is_soft_failure(&self) -> bool {
        self.confidence == 0.0
    }
}

/// Contract every routable capability implements
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier used in results and logs
    fn id(&self) -> &str;

    /// Execute the capability for one query
    ///
    /// # Errors
    ///
    /// Returns an error only for unexpected execution failures. Expected
    /// "no data" conditions must be reported as a soft-failure result.
    async fn execute(&self, query: &str, context: &ContextBag)
        -> Result<AgentResult, PipelineError>;
}

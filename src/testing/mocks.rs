//! Mock implementations for testing
//!
//! Scripted agents with call counting, plus a recording history observer, so
//! tests can assert exactly how often and with what the pipeline invoked a
//! capability.

use crate::agents::{Agent, AgentResult, ContextBag};
use crate::error::PipelineError;
use crate::pipeline::HistoryObserver;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Agent that always succeeds with a fixed response
#[derive(Debug)]
pub struct MockAgent {
    id: String,
    response: String,
    calls: AtomicU32,
}

impl MockAgent {
    pub fn single_response<I: Into<String>, R: Into<String>>(id: I, response: R) -> Self {
        Self {
            id: id.into(),
            response: response.into(),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of times `execute` was invoked
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        _query: &str,
        _context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AgentResult::new(self.id.clone(), self.response.clone(), 0.9))
    }
}

/// Agent that fails a set number of times before succeeding
#[derive(Debug)]
pub struct FlakyAgent {
    id: String,
    failures_before_success: u32,
    calls: AtomicU32,
}

impl FlakyAgent {
    pub fn new<I: Into<String>>(id: I, failures_before_success: u32) -> Self {
        Self {
            id: id.into(),
            failures_before_success,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for FlakyAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        _query: &str,
        _context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures_before_success {
            Err(PipelineError::agent_failure(format!(
                "transient failure on attempt {attempt}"
            )))
        } else {
            Ok(AgentResult::new(self.id.clone(), "recovered", 0.9))
        }
    }
}

/// Agent that always reports an expected "no data" soft failure
#[derive(Debug)]
pub struct SoftFailingAgent {
    id: String,
    message: String,
    calls: AtomicU32,
}

impl SoftFailingAgent {
    pub fn new<I: Into<String>, M: Into<String>>(id: I, message: M) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for SoftFailingAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        _query: &str,
        _context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AgentResult::soft_failure(
            self.id.clone(),
            self.message.clone(),
        ))
    }
}

/// Agent that always fails with a non-transient programming error
#[derive(Debug)]
pub struct BrokenAgent {
    id: String,
    calls: AtomicU32,
}

impl BrokenAgent {
    pub fn new<I: Into<String>>(id: I) -> Self {
        Self {
            id: id.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for BrokenAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        _query: &str,
        _context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PipelineError::internal_error("agent invariant violated"))
    }
}

/// Agent that always fails with an unexpected execution error
#[derive(Debug)]
pub struct FailingAgent {
    id: String,
    calls: AtomicU32,
}

impl FailingAgent {
    pub fn new<I: Into<String>>(id: I) -> Self {
        Self {
            id: id.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        _query: &str,
        _context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PipelineError::agent_failure("downstream unavailable"))
    }
}

/// Observer that records every history snapshot it sees
#[derive(Debug, Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<Vec<AgentResult>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<AgentResult>> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl HistoryObserver for RecordingObserver {
    fn on_history_appended(&self, history: &[AgentResult]) {
        self.snapshots.lock().unwrap().push(history.to_vec());
    }
}

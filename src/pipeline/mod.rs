//! Request pipeline: Guard → Route → Execute → Verify → Respond
//!
//! One request flows through one [`Orchestrator`] invocation at a time; the
//! machine is strictly forward-progressing and terminates in exactly one of
//! `Blocked` or `Done`. Many requests may be in flight concurrently, each in
//! its own logical task.

mod history;
mod orchestrator;
mod router;

pub use history::{History, HistoryObserver};
pub use orchestrator::{Orchestrator, PipelineStage, Request};
pub use router::{KeywordRouter, RoutingDecision};

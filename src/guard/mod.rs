//! Heuristic safety gate for inbound queries and outbound agent content
//!
//! The guard is a fixed, auditable rule set — no learning, no external calls.
//! It is applied twice per request: to the raw query before routing, and to
//! the agent's output before the response leaves the pipeline.

mod patterns;
mod verifier;

pub use patterns::{PatternGuard, Verdict};
pub use verifier::{OutputVerifier, VerificationResult};

/// Fixed response substituted for blocked input and flagged output
pub const REDACTION_MESSAGE: &str = "[REDACTED: SECURITY VIOLATION]";

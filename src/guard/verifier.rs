//! Output verification
//!
//! Re-applies the pattern guard to agent output before it leaves the
//! pipeline. Flagged content is replaced wholesale with the fixed redaction
//! message; clean content passes through byte-for-byte.

use super::patterns::{PatternGuard, Verdict};
use super::REDACTION_MESSAGE;
use serde::{Deserialize, Serialize};

/// Outcome of verifying one piece of agent output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    pub is_verified: bool,
    pub confidence: f64,
    pub sanitized_content: String,
}

/// Verifier applied to agent output in the pipeline's Verifying state
#[derive(Debug, Clone, Default)]
pub struct OutputVerifier {
    guard: PatternGuard,
}

impl OutputVerifier {
    pub fn new() -> Self {
        Self {
            guard: PatternGuard::new(),
        }
    }

    /// Verify agent content, substituting the redaction message when flagged
    pub fn verify(&self, content: &str) -> VerificationResult {
        match self.guard.classify(content) {
            Verdict::Safe => VerificationResult {
                is_verified: true,
                confidence: 0.95,
                sanitized_content: content.to_string(),
            },
            Verdict::Unsafe => VerificationResult {
                is_verified: false,
                confidence: 0.2,
                sanitized_content: REDACTION_MESSAGE.to_string(),
            },
        }
    }
}

//! Injection pattern matching
//!
//! An ordered list of case-insensitive matchers targeting instruction
//! override, role hijack, privilege escalation tokens, secret exfiltration,
//! and output-structure coercion. Text is unsafe iff any rule matches; the
//! verdict is order-independent. This is a best-effort heuristic gate, not a
//! security boundary of record.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Injection heuristics applied to inbound queries and agent output
const INJECTION_PATTERNS: [&str; 8] = [
    r"(?i)ignore (all )?previous (instructions|directives)",
    r"(?i)system (role|prompt)",
    r"(?i)you are now a",
    r"(?i)bypass",
    r"(?i)reveal your (secret|hidden)",
    r"(?i)output (as|in) JSON (only|format)",
    r"(?i)\bsudo\b",
    r"(?i)\bexecute\b",
];

static RULE_SET: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new(INJECTION_PATTERNS).expect("injection patterns must compile"));

/// Guard verdict for a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe,
}

/// Stateless classifier over the fixed injection rule set
///
/// Cheap to construct and `Copy`-free by design: all instances share the one
/// compiled rule set, so the guard can be held by value wherever it is used.
#[derive(Debug, Clone, Default)]
pub struct PatternGuard;

impl PatternGuard {
    pub fn new() -> Self {
        Self
    }

    /// Classify text as safe or unsafe
    ///
    /// Never fails: empty or malformed input is safe.
    pub fn classify(&self, text: &str) -> Verdict {
        if RULE_SET.is_match(text) {
            Verdict::Unsafe
        } else {
            Verdict::Safe
        }
    }

    /// Convenience predicate for the unsafe verdict
    pub fn is_unsafe(&self, text: &str) -> bool {
        self.classify(text) == Verdict::Unsafe
    }
}

//! Keyword routing
//!
//! Deterministic, explicit ordered rule matching over the lower-cased query:
//! the first rule whose keyword appears in the query wins, and queries that
//! match no rule fall through to the default capability. Routing is total —
//! a non-blocked query always selects exactly one capability.

use tracing::debug;

/// Routing outcome for one request
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Request was rejected by the pattern guard; no capability runs
    Blocked,
    /// Exactly one capability was selected
    Capability(String),
}

impl RoutingDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, RoutingDecision::Blocked)
    }

    /// Extract the capability name if one was selected
    pub fn capability(&self) -> Option<&str> {
        match self {
            RoutingDecision::Capability(name) => Some(name),
            RoutingDecision::Blocked => None,
        }
    }
}

/// One ordered routing rule: any keyword hit selects the capability
#[derive(Debug, Clone)]
struct RoutingRule {
    capability: String,
    keywords: Vec<&'static str>,
}

/// Ordered keyword matcher selecting a capability for each query
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    rules: Vec<RoutingRule>,
    default_capability: String,
}

impl Default for KeywordRouter {
    /// The stock rule set: EDA keywords are checked before forecasting ones,
    /// and unmatched queries default to `eda`.
    fn default() -> Self {
        Self::new("eda")
            .rule("eda", &["profile", "eda", "analyze", "anomalies"])
            .rule("forecast", &["forecast", "predict", "sales", "future"])
    }
}

impl KeywordRouter {
    /// The stock rule set with a custom fallback capability
    pub fn with_default<S: Into<String>>(default_capability: S) -> Self {
        let mut router = Self::default();
        router.default_capability = default_capability.into();
        router
    }

    /// Create a router with no rules and the given fallback capability
    pub fn new<S: Into<String>>(default_capability: S) -> Self {
        Self {
            rules: Vec::new(),
            default_capability: default_capability.into(),
        }
    }

    /// Append a rule; rules are evaluated in insertion order
    pub fn rule<S: Into<String>>(mut self, capability: S, keywords: &[&'static str]) -> Self {
        self.rules.push(RoutingRule {
            capability: capability.into(),
            keywords: keywords.to_vec(),
        });
        self
    }

    pub fn default_capability(&self) -> &str {
        &self.default_capability
    }

    /// Select the capability for a query; first matching rule wins
    pub fn route(&self, query: &str) -> &str {
        let query = query.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|kw| query.contains(kw)) {
                debug!(capability = %rule.capability, "Keyword rule matched");
                return &rule.capability;
            }
        }
        debug!(capability = %self.default_capability, "No rule matched; using default");
        &self.default_capability
    }
}

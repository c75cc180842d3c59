//! Per-request execution history
//!
//! An append-only, insertion-ordered sequence of agent results kept for the
//! lifetime of one request. Entries are never mutated in place. A collaborator
//! (e.g. an audit log) can consume appends through [`HistoryObserver`].

use crate::agents::AgentResult;

/// Ordered record of every agent result produced for one request
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<AgentResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result; insertion order is significant
    pub fn push(&mut self, result: AgentResult) {
        self.entries.push(result);
    }

    pub fn as_slice(&self) -> &[AgentResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<AgentResult> {
        self.entries
    }
}

/// Optional observer notified after every history append
pub trait HistoryObserver: Send + Sync {
    fn on_history_appended(&self, history: &[AgentResult]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut history = History::new();
        history.push(AgentResult::new("a", "first", 0.9));
        history.push(AgentResult::new("b", "second", 0.8));

        assert_eq!(history.len(), 2);
        assert_eq!(history.as_slice()[0].content, "first");
        assert_eq!(history.as_slice()[1].content, "second");
    }

    #[test]
    fn test_empty_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.as_slice().is_empty());
    }
}

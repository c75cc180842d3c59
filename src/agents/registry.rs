//! Capability registry
//!
//! Maps capability names to agent instances. Populated once at startup via
//! [`RegistryBuilder`] and immutable afterwards, so concurrent requests can
//! read it without locking.

use super::Agent;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Read-only mapping from capability name to agent instance
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up the agent registered for a capability
    pub fn get(&self, capability: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(capability).cloned()
    }

    /// Whether a capability is registered
    pub fn contains(&self, capability: &str) -> bool {
        self.agents.contains_key(capability)
    }

    /// Names of all registered capabilities
    pub fn capabilities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Builder collecting capability registrations before the registry freezes
#[derive(Default)]
pub struct RegistryBuilder {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl RegistryBuilder {
    /// Register an agent under a capability name; later registrations win
    pub fn register<S: Into<String>>(mut self, capability: S, agent: Arc<dyn Agent>) -> Self {
        let capability = capability.into();
        info!(capability = %capability, agent_id = %agent.id(), "Registered capability");
        self.agents.insert(capability, agent);
        self
    }

    pub fn build(self) -> CapabilityRegistry {
        CapabilityRegistry {
            agents: self.agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{EdaAgent, ForecastingAgent};

    #[test]
    fn test_lookup_after_build() {
        let registry = CapabilityRegistry::builder()
            .register("eda", Arc::new(EdaAgent::new()))
            .register("forecast", Arc::new(ForecastingAgent::new()))
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("eda"));
        assert!(registry.contains("forecast"));
        assert!(registry.get("eda").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_capabilities_are_sorted() {
        let registry = CapabilityRegistry::builder()
            .register("forecast", Arc::new(ForecastingAgent::new()))
            .register("eda", Arc::new(EdaAgent::new()))
            .build();

        assert_eq!(registry.capabilities(), vec!["eda", "forecast"]);
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let registry = CapabilityRegistry::builder()
            .register("eda", Arc::new(ForecastingAgent::new()))
            .register("eda", Arc::new(EdaAgent::new()))
            .build();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("eda").unwrap().id(), "eda-agent");
    }
}

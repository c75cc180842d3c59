//! Configuration for the task-routing pipeline
//!
//! Loaded from TOML. All sections are optional; defaults match the pipeline's
//! documented parameters (breaker threshold 5 / recovery 60s, retry budget of
//! 3 attempts starting at 1s with 2.0x backoff).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub resilience: ResilienceSection,
    #[serde(default)]
    pub routing: RoutingSection,
}

/// Circuit breaker and retry parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResilienceSection {
    /// Consecutive failures before a capability's breaker trips open
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds an open breaker waits before allowing a trial call
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
    /// Maximum execution attempts per request (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for ResilienceSection {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl ResilienceSection {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Keyword routing parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingSection {
    /// Capability selected when no keyword rule matches
    #[serde(default = "default_capability")]
    pub default_capability: String,
}

fn default_capability() -> String {
    "eda".to_string()
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            default_capability: default_capability(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resilience.failure_threshold == 0 {
            return Err(ConfigError::InvalidConfig(
                "resilience.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.resilience.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "resilience.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.resilience.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidConfig(
                "resilience.backoff_multiplier must be >= 1.0".to_string(),
            ));
        }
        if self.routing.default_capability.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "routing.default_capability must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration for tests: small delays so timer-driven tests stay fast
    pub fn test_config() -> Self {
        let toml_content = r#"
[resilience]
failure_threshold = 3
recovery_timeout_secs = 5
max_attempts = 3
base_delay_ms = 10
backoff_multiplier = 2.0

[routing]
default_capability = "eda"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

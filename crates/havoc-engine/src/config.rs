//! Engine configuration surface.
//!
//! Configuration is an explicit struct passed at construction; there is no
//! process-wide settings singleton. Files are TOML with every field
//! optional, falling back to the defaults below.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::escalation::EscalationConfig;

/// Tuning for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub action_queue_capacity: usize,
    pub event_queue_capacity: usize,
    pub submit_timeout_ms: u64,
    pub submit_retry_ms: u64,
    pub worker_poll_ms: u64,
    pub escalation: EscalationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_queue_capacity: 64,
            event_queue_capacity: 64,
            submit_timeout_ms: 3_000,
            submit_retry_ms: 25,
            worker_poll_ms: 250,
            escalation: EscalationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validates the config before an engine is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.action_queue_capacity == 0 {
            bail!("action_queue_capacity must be >= 1");
        }
        if self.event_queue_capacity == 0 {
            bail!("event_queue_capacity must be >= 1");
        }
        if self.submit_retry_ms == 0 {
            bail!("submit_retry_ms must be >= 1");
        }
        if self.worker_poll_ms == 0 {
            bail!("worker_poll_ms must be >= 1");
        }
        self.escalation.validate()
    }

    /// Loads a config from a TOML file; missing fields keep their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

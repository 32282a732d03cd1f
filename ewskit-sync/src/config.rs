//! Client configuration.

use crate::error::{EwsError, EwsResult};
use ewskit_model::Namespaces;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service endpoint URL.
    pub endpoint: String,
    /// Entries requested per listing page.
    pub batch_size: u32,
    /// Per-request timeout (in seconds).
    pub timeout_secs: u64,
    /// Retries after a transient server error.
    pub max_retries: u32,
    /// First backoff interval (in milliseconds); doubles per retry.
    pub retry_initial_interval_ms: u64,
    /// Prefix table used for every locator the client resolves.
    pub namespaces: Namespaces,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            batch_size: 1000,
            timeout_secs: 30,
            max_retries: 2,
            retry_initial_interval_ms: 500,
            namespaces: Namespaces::ews(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> EwsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EwsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EwsResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(EwsError::Config("endpoint must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(EwsError::Config("batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

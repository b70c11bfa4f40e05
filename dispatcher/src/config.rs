//! Configuration for the downstream endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default downstream service address.
pub const DEFAULT_ENDPOINT: &str = "localhost:6666";

/// Default deadline for each I/O step, in seconds.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the downstream worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// `host:port` of the downstream service.
    pub endpoint: String,

    /// Deadline for connecting, writing and reading, each.
    pub io_timeout_secs: u64,
}

impl DispatcherConfig {
    /// Create a config for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
        }
    }

    /// Set the per-step I/O deadline in seconds.
    pub fn with_io_timeout_secs(mut self, secs: u64) -> Self {
        self.io_timeout_secs = secs;
        self
    }

    /// The per-step I/O deadline.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

//! Configuration for the whole pipeline.

use std::path::{Path, PathBuf};

use nzbdefer_directory_watcher::WatchConfig;
use nzbdefer_dispatcher::DispatcherConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::queue::DEFAULT_QUEUE_CAPACITY;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_ENV_VAR: &str = "NZBDEFER_CONFIG";

/// Configuration for the discovery-to-dispatch pipeline.
///
/// Every field has a default, so an empty file (or no file) yields a working
/// configuration that watches `/mnt/data/nzbs` for `.nzb` files and
/// dispatches to `localhost:6666`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Slots in the work queue between watcher and registrar.
    pub queue_capacity: usize,

    /// Directory watching.
    pub watch: WatchConfig,

    /// Downstream endpoint.
    pub dispatch: DispatcherConfig,
}

impl PipelineConfig {
    /// Load from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from the file named by `NZBDEFER_CONFIG`, if set.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load(path.as_deref())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(PipelineError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.watch.extension.is_empty() {
            return Err(PipelineError::Config(
                "watch.extension must not be empty".to_string(),
            ));
        }
        if self.dispatch.endpoint.trim().is_empty() {
            return Err(PipelineError::Config(
                "dispatch.endpoint must not be empty".to_string(),
            ));
        }
        if self.dispatch.io_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "dispatch.io_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            watch: WatchConfig::default(),
            dispatch: DispatcherConfig::default(),
        }
    }
}

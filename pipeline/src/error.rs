//! Error types for the pipeline.

use nzbdefer_directory_watcher::WatcherError;
use nzbdefer_scheduler::SchedulerError;
use thiserror::Error;

use crate::queue::QueueError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that stop the pipeline from starting or running.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for [`crate::PipelineConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory watcher error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Work queue error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// A pipeline task panicked or was aborted.
    #[error("task failed: {0}")]
    Task(String),
}

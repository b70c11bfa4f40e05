//! Error types for the scheduling engine.

use thiserror::Error;

use crate::types::JobId;

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur within the scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The provided schedule definition is invalid or has no future occurrence.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// No job with the given ID is registered.
    #[error("job not found: {id}")]
    JobNotFound {
        /// The unknown job.
        id: JobId,
    },

    /// The engine was shut down and accepts no more jobs.
    #[error("scheduler has been shut down")]
    ShutDown,
}

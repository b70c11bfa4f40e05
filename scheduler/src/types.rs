use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rule::WeeklyRule;

/// Identifier of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for `next_run`.
    Armed,
    /// The trigger instant was reached and the task was handed to a worker.
    Fired,
    /// Cancelled explicitly or by engine shutdown. Terminal.
    Cancelled,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Armed => "armed",
            JobState::Fired => "fired",
            JobState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of a registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Engine-assigned identifier.
    pub id: JobId,
    /// Human-readable label.
    pub name: String,
    /// Recurrence rule.
    pub rule: WeeklyRule,
    /// Current lifecycle state.
    pub state: JobState,
    /// Next planned execution, if any.
    pub next_run: Option<NaiveDateTime>,
    /// Most recent trigger instant, if any.
    pub last_run: Option<NaiveDateTime>,
    /// Number of times the job has fired.
    pub run_count: u32,
    /// Wall-clock time of registration.
    pub registered_at: NaiveDateTime,
}

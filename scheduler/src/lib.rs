//! # Scheduler
//!
//! An in-process job scheduler for weekly recurring work. Jobs live only in
//! memory: a restart forgets every pending job.
//!
//! ## Overview
//!
//! A [`WeeklyRule`] names a set of weekdays and a set of local times of day.
//! [`SchedulerHandle::add_job`] resolves the first occurrence strictly after
//! "now" (an occurrence earlier today rolls over to next week), and the
//! [`SchedulerEngine`] fires the job's [`JobTask`] at that instant and at every
//! following occurrence until the job is cancelled or the engine shuts down.
//!
//! | State       | Meaning                                          |
//! |-------------|--------------------------------------------------|
//! | `Armed`     | Waiting for `next_run`                           |
//! | `Fired`     | Task handed to a worker, about to re-arm         |
//! | `Cancelled` | Explicitly cancelled or engine shut down         |

pub mod clock;
pub mod engine;
pub mod error;
pub mod rule;
pub mod task;
pub mod types;

pub use clock::{Clock, SystemClock, TimerClock};
pub use engine::{SchedulerEngine, SchedulerHandle};
pub use error::{Result, SchedulerError};
pub use rule::WeeklyRule;
pub use task::JobTask;
pub use types::{JobId, JobInfo, JobState};

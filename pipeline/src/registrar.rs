//! Turns candidate paths into weekly dispatch jobs.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, SubsecRound, TimeDelta, Timelike};
use nzbdefer_directory_watcher::CandidatePath;
use nzbdefer_dispatcher::Dispatcher;
use nzbdefer_scheduler::{JobInfo, SchedulerError, SchedulerHandle, WeeklyRule};
use tracing::{error, info};

use crate::queue::QueueReceiver;

/// How far before the registration minute the weekly trigger is placed.
pub const TRIGGER_LEAD_MINUTES: i64 = 5;

/// Weekly rule for a path registered at `now`.
///
/// The anchor is `now` truncated to the minute, minus five minutes. The rule
/// fires on the anchor's weekday at the anchor's time of day. Since the
/// anchor is always in the past, the first occurrence is one week after it.
/// Before minute 5 of an hour the subtraction borrows from the hour (and
/// before 00:05 from the previous day), so weekday and time always describe
/// the same real instant.
pub fn trigger_rule(now: NaiveDateTime) -> WeeklyRule {
    let whole_seconds = now.trunc_subsecs(0);
    let anchor = whole_seconds
        - TimeDelta::seconds(i64::from(whole_seconds.second()))
        - TimeDelta::minutes(TRIGGER_LEAD_MINUTES);

    WeeklyRule::at(anchor.weekday(), anchor.time())
}

/// Consumes candidate paths and registers one dispatch job per path.
///
/// Repeated discovery of the same path registers another job; there is no
/// deduplication.
#[derive(Clone)]
pub struct Registrar {
    scheduler: SchedulerHandle,
    dispatcher: Arc<Dispatcher>,
}

impl Registrar {
    /// Create a registrar feeding `scheduler` with jobs that use `dispatcher`.
    pub fn new(scheduler: SchedulerHandle, dispatcher: Dispatcher) -> Self {
        Self {
            scheduler,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Register a weekly dispatch job for one candidate.
    ///
    /// Failures are logged and returned; the candidate is not retried.
    pub async fn register(&self, candidate: CandidatePath) -> Result<JobInfo, SchedulerError> {
        let name = candidate.to_string();
        let path = candidate.into_path_buf();
        let rule = trigger_rule(self.scheduler.now());

        let dispatcher = self.dispatcher.clone();
        let task = move || {
            let dispatcher = dispatcher.clone();
            let path = path.clone();
            async move {
                dispatcher.attempt(&path).await;
            }
        };

        match self.scheduler.add_job(name.as_str(), rule, task).await {
            Ok(job) => {
                match job.next_run {
                    Some(next_run) => info!("New job scheduled: {name} @ {next_run}"),
                    None => info!("New job scheduled: {name}"),
                }
                Ok(job)
            }
            Err(e) => {
                error!("Failed to schedule job for {name}: {e}");
                Err(e)
            }
        }
    }

    /// Register every candidate from `queue` in order until it is closed and
    /// drained. Returns the number of jobs registered.
    pub async fn run(self, mut queue: QueueReceiver<CandidatePath>) -> usize {
        let mut registered = 0;
        let mut failed = 0;

        while let Some(candidate) = queue.dequeue().await {
            match self.register(candidate).await {
                Ok(_) => registered += 1,
                Err(_) => failed += 1,
            }
        }

        info!(registered, failed, "Work queue closed, registrar stopped");
        registered
    }
}

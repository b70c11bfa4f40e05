//! Job registry and timer-driven execution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Result, SchedulerError};
use crate::rule::WeeklyRule;
use crate::task::JobTask;
use crate::types::{JobId, JobInfo, JobState};

struct JobRecord {
    info: JobInfo,
    cancel: CancellationToken,
}

struct Inner {
    clock: Arc<dyn Clock>,
    jobs: RwLock<HashMap<JobId, JobRecord>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Inner {
    async fn update(&self, id: JobId, f: impl FnOnce(&mut JobInfo)) {
        if let Some(record) = self.jobs.write().await.get_mut(&id) {
            f(&mut record.info);
        }
    }
}

/// Owner of all scheduled jobs.
///
/// Each job runs on its own tokio task that sleeps until the next trigger,
/// hands the job's [`JobTask`] to a worker task and re-arms. Dropping the
/// engine cancels every job; [`SchedulerEngine::shutdown`] additionally waits
/// for in-flight tasks to finish.
pub struct SchedulerEngine {
    inner: Arc<Inner>,
}

impl SchedulerEngine {
    /// Create an engine reading wall-clock time from `clock`.
    pub fn new(clock: impl Clock) -> Self {
        info!("scheduler engine started");
        Self {
            inner: Arc::new(Inner {
                clock: Arc::new(clock),
                jobs: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// A cloneable handle for registering and managing jobs.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: self.inner.clone(),
        }
    }

    /// Cancel every job and wait for running tasks to complete.
    pub async fn shutdown(self) {
        let pending = self.inner.jobs.read().await.len();
        info!(jobs = pending, "scheduler engine shutting down");

        self.inner.shutdown.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.jobs.write().await.clear();

        info!("scheduler engine stopped");
    }
}

impl Drop for SchedulerEngine {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

/// Shared handle for job management while the engine runs.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<Inner>,
}

impl SchedulerHandle {
    /// Register a job. It is armed immediately for the first occurrence of
    /// `rule` strictly after the current time.
    pub async fn add_job<T: JobTask>(
        &self,
        name: impl Into<String>,
        rule: WeeklyRule,
        task: T,
    ) -> Result<JobInfo> {
        if self.inner.shutdown.is_cancelled() {
            return Err(SchedulerError::ShutDown);
        }

        let now = self.inner.clock.now();
        let next_run = rule.next_after(now).ok_or_else(|| {
            SchedulerError::InvalidSchedule(format!("no occurrence after {now}"))
        })?;

        let info = JobInfo {
            id: JobId::new(),
            name: name.into(),
            rule: rule.clone(),
            state: JobState::Armed,
            next_run: Some(next_run),
            last_run: None,
            run_count: 0,
            registered_at: now,
        };
        let cancel = self.inner.shutdown.child_token();

        self.inner.jobs.write().await.insert(
            info.id,
            JobRecord {
                info: info.clone(),
                cancel: cancel.clone(),
            },
        );

        self.inner.tracker.spawn(drive_job(
            self.inner.clone(),
            info.id,
            rule,
            next_run,
            Arc::new(task),
            cancel,
        ));

        info!(job_id = %info.id, name = %info.name, %next_run, "job added");
        Ok(info)
    }

    /// Cancel a job. Returns its final snapshot.
    pub async fn cancel(&self, id: JobId) -> Result<JobInfo> {
        let record = self
            .inner
            .jobs
            .write()
            .await
            .remove(&id)
            .ok_or(SchedulerError::JobNotFound { id })?;

        record.cancel.cancel();

        let mut info = record.info;
        info.state = JobState::Cancelled;
        info.next_run = None;

        info!(job_id = %id, name = %info.name, "job cancelled");
        Ok(info)
    }

    /// Snapshot of one job.
    pub async fn job(&self, id: JobId) -> Option<JobInfo> {
        self.inner
            .jobs
            .read()
            .await
            .get(&id)
            .map(|record| record.info.clone())
    }

    /// Snapshots of all jobs, ordered by registration time.
    pub async fn jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .inner
            .jobs
            .read()
            .await
            .values()
            .map(|record| record.info.clone())
            .collect();
        jobs.sort_by_key(|info| info.registered_at);
        jobs
    }

    /// The engine's notion of the current wall-clock time.
    pub fn now(&self) -> NaiveDateTime {
        self.inner.clock.now()
    }

    /// Whether the engine still accepts jobs.
    pub fn is_running(&self) -> bool {
        !self.inner.shutdown.is_cancelled()
    }
}

async fn drive_job(
    inner: Arc<Inner>,
    id: JobId,
    rule: WeeklyRule,
    mut next_run: NaiveDateTime,
    task: Arc<dyn JobTask>,
    cancel: CancellationToken,
) {
    loop {
        let delay = (next_run - inner.clock.now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let fired_at = next_run;
        let following = rule.next_after(fired_at);

        inner
            .update(id, |info| {
                info.state = JobState::Fired;
                info.last_run = Some(fired_at);
                info.run_count += 1;
                info.next_run = following;
            })
            .await;
        debug!(job_id = %id, %fired_at, "job fired");

        let worker_task = task.clone();
        inner.tracker.spawn(async move {
            worker_task.run().await;
        });

        match following {
            Some(next) => {
                next_run = next;
                inner.update(id, |info| info.state = JobState::Armed).await;
            }
            None => {
                warn!(job_id = %id, "no further occurrence, job retired");
                break;
            }
        }
    }

    inner.jobs.write().await.remove(&id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TimerClock;
    use chrono::{NaiveDate, NaiveTime, SubsecRound, Weekday};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn recording_task(
        clock: TimerClock,
        fired: Arc<Mutex<Vec<NaiveDateTime>>>,
    ) -> impl JobTask {
        move || {
            let fired = fired.clone();
            async move {
                fired.lock().unwrap().push(clock.now().trunc_subsecs(0));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_fires_weekly() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let handle = engine.handle();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        let info = handle
            .add_job("a.nzb", rule, recording_task(clock, fired.clone()))
            .await
            .unwrap();

        assert_eq!(info.state, JobState::Armed);
        assert_eq!(info.next_run, Some(at(15, 10, 27)));

        tokio::time::sleep(15 * DAY).await;

        assert_eq!(*fired.lock().unwrap(), vec![at(15, 10, 27), at(22, 10, 27)]);

        let current = handle.job(info.id).await.unwrap();
        assert_eq!(current.state, JobState::Armed);
        assert_eq!(current.run_count, 2);
        assert_eq!(current.last_run, Some(at(22, 10, 27)));
        assert_eq!(current.next_run, Some(at(29, 10, 27)));

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_trigger() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let fired = Arc::new(Mutex::new(Vec::new()));

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        engine
            .handle()
            .add_job("a.nzb", rule, recording_task(clock, fired.clone()))
            .await
            .unwrap();

        tokio::time::sleep(6 * DAY).await;
        assert!(fired.lock().unwrap().is_empty());

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_fires() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let handle = engine.handle();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        let info = handle
            .add_job("a.nzb", rule, recording_task(clock, fired.clone()))
            .await
            .unwrap();

        let cancelled = handle.cancel(info.id).await.unwrap();
        assert_eq!(cancelled.state, JobState::Cancelled);
        assert_eq!(cancelled.next_run, None);

        tokio::time::sleep(8 * DAY).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(handle.job(info.id).await.is_none());
        assert!(matches!(
            handle.cancel(info.id).await,
            Err(SchedulerError::JobNotFound { .. })
        ));

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_rejects_new_jobs() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let handle = engine.handle();

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        handle
            .add_job("a.nzb", rule.clone(), || async {})
            .await
            .unwrap();
        assert_eq!(handle.jobs().await.len(), 1);

        engine.shutdown().await;

        assert!(!handle.is_running());
        assert!(handle.jobs().await.is_empty());
        assert!(matches!(
            handle.add_job("b.nzb", rule, || async {}).await,
            Err(SchedulerError::ShutDown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_engine_cancels_jobs() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let handle = engine.handle();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        handle
            .add_job("a.nzb", rule, recording_task(clock, fired.clone()))
            .await
            .unwrap();

        drop(engine);

        tokio::time::sleep(8 * DAY).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_task_does_not_delay_rescheduling() {
        let clock = TimerClock::starting_at(at(8, 10, 32));
        let engine = SchedulerEngine::new(clock);
        let handle = engine.handle();
        let started = Arc::new(Mutex::new(Vec::new()));

        let rule = WeeklyRule::at(Weekday::Mon, NaiveTime::from_hms_opt(10, 27, 0).unwrap());
        let log = started.clone();
        handle
            .add_job("slow", rule, move || {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(clock.now().trunc_subsecs(0));
                    tokio::time::sleep(10 * DAY).await;
                }
            })
            .await
            .unwrap();

        tokio::time::sleep(15 * DAY).await;
        assert_eq!(*started.lock().unwrap(), vec![at(15, 10, 27), at(22, 10, 27)]);

        engine.shutdown().await;
    }
}

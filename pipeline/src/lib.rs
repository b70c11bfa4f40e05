//! # Pipeline
//!
//! Wires the nzbdefer components together:
//!
//! ```text
//! CandidateSource ──► work queue ──► Registrar ──► SchedulerEngine ──► Dispatcher
//!   (backlog +        (bounded,       (weekly        (fires ~7 days      (TCP line
//!    create events)    blocking)       trigger)        after discovery)    exchange)
//! ```
//!
//! The scheduler engine is owned by the caller and passed in as a
//! [`SchedulerHandle`], so the caller decides when it shuts down.

pub mod config;
pub mod error;
pub mod queue;
pub mod registrar;

use std::future::Future;

use nzbdefer_directory_watcher::{CandidatePath, CandidateSource};
use nzbdefer_dispatcher::Dispatcher;
use nzbdefer_scheduler::SchedulerHandle;
use tracing::{info, warn};

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use queue::{QueueError, QueueReceiver, QueueSender, work_queue};
pub use registrar::{Registrar, trigger_rule};

/// Move every candidate from `source` into the queue.
///
/// Waits whenever the queue is full. Returns the number of forwarded
/// candidates once the source ends or the receiver goes away; the queue is
/// closed on return.
pub async fn forward_candidates(
    source: CandidateSource,
    queue: QueueSender<CandidatePath>,
) -> usize {
    forward_until(source, queue, std::future::pending()).await
}

/// Like [`forward_candidates`], but stops taking candidates from `source`
/// once `shutdown` completes.
///
/// Shutdown is only observed between candidates: one that was already taken
/// from the source is still queued, waiting for a free slot if necessary.
pub async fn forward_until(
    mut source: CandidateSource,
    queue: QueueSender<CandidatePath>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut forwarded = 0;

    loop {
        let candidate = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping directory watcher");
                source.stop_watching();
                break;
            }
            candidate = source.next() => candidate,
        };

        let Some(candidate) = candidate else {
            info!(forwarded, "Directory watch stream ended");
            break;
        };

        if queue.enqueue(candidate).await.is_err() {
            warn!("Work queue closed, dropping remaining candidates");
            break;
        }
        forwarded += 1;
    }

    queue.close();
    forwarded
}

/// Open the watched directory and run the pipeline until `shutdown`
/// completes or the watch stream ends.
///
/// Opening the watch or listing the directory fails fast.
pub async fn run_pipeline(
    config: &PipelineConfig,
    scheduler: SchedulerHandle,
    shutdown: impl Future<Output = ()>,
) -> Result<usize> {
    config.validate()?;

    let source = CandidateSource::open(config.watch.clone())?;
    let dispatcher = Dispatcher::new(config.dispatch.clone());
    info!("Dispatching to {}", dispatcher.endpoint());

    run_with_source(source, config.queue_capacity, dispatcher, scheduler, shutdown).await
}

/// Run the pipeline over an already opened source.
///
/// When `shutdown` completes, the source stops being read and the queue is
/// closed; the registrar still registers everything already buffered,
/// including a candidate that was waiting for a free slot. Returns the number
/// of registered jobs.
pub async fn run_with_source(
    source: CandidateSource,
    queue_capacity: usize,
    dispatcher: Dispatcher,
    scheduler: SchedulerHandle,
    shutdown: impl Future<Output = ()>,
) -> Result<usize> {
    let (sender, receiver) = work_queue(queue_capacity)?;

    let registrar = Registrar::new(scheduler, dispatcher);
    let registrar_task = tokio::spawn(registrar.run(receiver));

    forward_until(source, sender, shutdown).await;

    registrar_task
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))
}

//! The action a job runs when it fires.

use std::future::Future;

use async_trait::async_trait;

/// Work executed each time a job fires.
///
/// Tasks run on engine-managed tokio tasks, possibly concurrently with each
/// other. They have no way to report failure to the engine; a task that fails
/// simply fires again at its next occurrence.
#[async_trait]
pub trait JobTask: Send + Sync + 'static {
    /// Run the action once.
    async fn run(&self);
}

#[async_trait]
impl<F, Fut> JobTask for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self) {
        (self)().await;
    }
}

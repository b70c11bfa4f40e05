use anyhow::Context;
use nzbdefer_pipeline::{PipelineConfig, run_pipeline};
use nzbdefer_scheduler::{SchedulerEngine, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nzbdefer=info")),
        )
        .init();

    let config = PipelineConfig::from_env().context("failed to load configuration")?;

    let engine = SchedulerEngine::new(SystemClock);
    let result = run_pipeline(&config, engine.handle(), shutdown_signal()).await;

    // Pending jobs are in memory only; they are lost here.
    engine.shutdown().await;

    let registered = result.context("pipeline failed")?;
    info!(registered, "nzbdefer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

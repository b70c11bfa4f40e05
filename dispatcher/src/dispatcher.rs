//! One request, one response line, then close.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, DispatchStage, Result};

/// Upper bound on the size of a response line.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Record of one connection-send-receive cycle.
#[derive(Debug)]
pub struct DispatchAttempt {
    /// Path that was sent.
    pub path: PathBuf,

    /// When the attempt started.
    pub started_at: DateTime<Local>,

    /// How long the attempt took.
    pub elapsed: Duration,

    /// The response line without its terminator, or why there is none.
    pub outcome: Result<String>,
}

impl DispatchAttempt {
    /// Whether the service answered with a complete line.
    pub fn is_acknowledged(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The response line, if any.
    pub fn response(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }
}

/// Sends candidate paths to the downstream service.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    endpoint: String,
    io_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher from its configuration.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            io_timeout: config.io_timeout(),
            endpoint: config.endpoint,
        }
    }

    /// Override the per-step I/O deadline.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `path` and return the first response line without its terminator.
    ///
    /// The connection is dropped on every return path and shut down cleanly
    /// after a successful exchange.
    pub async fn dispatch(&self, path: &Path) -> Result<String> {
        let stream = self
            .bounded(DispatchStage::Connect, TcpStream::connect(&self.endpoint))
            .await?
            .map_err(|source| DispatchError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        let mut stream = BufReader::new(stream);

        let mut request = path.as_os_str().as_encoded_bytes().to_vec();
        request.push(b'\n');

        self.bounded(DispatchStage::Write, stream.get_mut().write_all(&request))
            .await?
            .map_err(DispatchError::Write)?;
        debug!("Sent {} byte request to {}", request.len(), self.endpoint);

        let mut line = Vec::new();
        let limit = MAX_RESPONSE_BYTES as u64;
        let received = self
            .bounded(
                DispatchStage::Read,
                (&mut stream).take(limit).read_until(b'\n', &mut line),
            )
            .await?
            .map_err(DispatchError::Read)?;

        if line.last() != Some(&b'\n') {
            if received as u64 >= limit {
                return Err(DispatchError::ResponseTooLong {
                    limit: MAX_RESPONSE_BYTES,
                });
            }
            return Err(DispatchError::Closed { received });
        }

        if let Err(e) = stream.into_inner().shutdown().await {
            debug!(endpoint = %self.endpoint, "Failed to shut down connection: {e}");
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Run one dispatch and log its outcome. Never fails.
    pub async fn attempt(&self, path: &Path) -> DispatchAttempt {
        let started_at = Local::now();
        let start = Instant::now();

        let outcome = self.dispatch(path).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(response) => info!(
                path = %path.display(),
                elapsed_ms = elapsed_millis(elapsed),
                "Response from service: {response}"
            ),
            Err(e) => error!(
                path = %path.display(),
                endpoint = %self.endpoint,
                "Dispatch failed: {e}"
            ),
        }

        DispatchAttempt {
            path: path.to_path_buf(),
            started_at,
            elapsed,
            outcome,
        }
    }

    async fn bounded<F: Future>(&self, stage: DispatchStage, fut: F) -> Result<F::Output> {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| DispatchError::Timeout { stage })
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

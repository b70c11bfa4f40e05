//! Error types for dispatch attempts.

use std::fmt;

use thiserror::Error;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// The I/O step a dispatch attempt was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// Opening the connection.
    Connect,
    /// Sending the request line.
    Write,
    /// Waiting for the response line.
    Read,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchStage::Connect => "connect",
            DispatchStage::Write => "write",
            DispatchStage::Read => "read",
        };
        write!(f, "{s}")
    }
}

/// Errors that end a single dispatch attempt.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Could not connect to the downstream service.
    #[error("error connecting to service at {endpoint}: {source}")]
    Connect {
        /// The configured endpoint.
        endpoint: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Sending the request failed.
    #[error("error sending request: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the response failed.
    #[error("error reading response: {0}")]
    Read(#[source] std::io::Error),

    /// The peer closed the connection before a complete line arrived.
    #[error("error reading response: connection closed after {received} byte(s) without newline")]
    Closed {
        /// Bytes received before the connection closed.
        received: usize,
    },

    /// The response line exceeded the size limit.
    #[error("error reading response: no newline within {limit} bytes")]
    ResponseTooLong {
        /// The configured limit.
        limit: usize,
    },

    /// A step did not complete within the I/O deadline.
    #[error("{stage} timed out")]
    Timeout {
        /// Step that timed out.
        stage: DispatchStage,
    },
}

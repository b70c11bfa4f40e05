//! # Dispatcher
//!
//! Hands a candidate path to the downstream worker service.
//!
//! The wire exchange is plain TCP: the client sends the path followed by a
//! single `\n`, reads one `\n`-terminated response line and closes the
//! connection. Each step is bounded by a configurable deadline so a hung peer
//! cannot stall a worker forever.

pub mod config;
pub mod dispatcher;
pub mod error;

pub use config::DispatcherConfig;
pub use dispatcher::{DispatchAttempt, Dispatcher};
pub use error::{DispatchError, DispatchStage, Result};

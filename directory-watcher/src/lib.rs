//! # Directory Watcher
//!
//! This crate discovers candidate files for the nzbdefer pipeline. It watches
//! a single flat directory and turns its contents into one ordered stream of
//! [`CandidatePath`] values.
//!
//! ## Features
//!
//! - **Backlog Scan**: Files already present at startup are replayed first
//! - **Real-time Watching**: Create events are forwarded as they arrive
//! - **Suffix Filter**: Only names ending with the configured extension pass
//! - **Backpressure**: A slow consumer stalls the notify thread, nothing is dropped
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchConfig ──► scan_backlog ──┐                               │
//! │       │                         ▼                               │
//! │       └────► notify ──► CandidateSource::next ──► CandidatePath │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod scan;
pub mod watcher;

pub use config::WatchConfig;
pub use error::{Result, WatcherError};
pub use event::{CandidatePath, WatchEvent, WatchEventKind};
pub use scan::scan_backlog;
pub use watcher::CandidateSource;

//! Candidate paths and raw watch events.

use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use serde::{Deserialize, Serialize};

/// A file discovered as newly matching the watched extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidatePath(PathBuf);

impl CandidatePath {
    /// Wrap a path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrow the underlying path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Unwrap into the underlying path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CandidatePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchEventKind {
    /// File was created.
    Created,

    /// File contents, metadata or name changed.
    Modified,

    /// File was removed.
    Removed,

    /// Access or unclassified event.
    Other,
}

impl From<notify::EventKind> for WatchEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(_) => Self::Modified,
            notify::EventKind::Remove(_) => Self::Removed,
            _ => Self::Other,
        }
    }
}

/// A single message delivered by the notification listener.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A change affecting one path.
    Change {
        /// What happened.
        kind: WatchEventKind,
        /// The affected path.
        path: PathBuf,
    },

    /// The underlying watcher reported an error.
    Error(String),
}

impl WatchEvent {
    /// Create a change event.
    pub fn change(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self::Change {
            kind,
            path: path.into(),
        }
    }

    /// Flatten a notify callback result into individual events.
    ///
    /// A file renamed or moved into the directory arrives as
    /// `Modify(Name(To))` and is reported as [`WatchEventKind::Created`].
    /// The paired `Modify(Name(Both))` event for the same rename stays a
    /// modification, so the destination is announced once.
    pub fn from_notify(res: std::result::Result<notify::Event, notify::Error>) -> Vec<Self> {
        match res {
            Ok(event) => {
                let kind = match event.kind {
                    notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                        WatchEventKind::Created
                    }
                    other => WatchEventKind::from(other),
                };
                event
                    .paths
                    .into_iter()
                    .map(|path| Self::change(kind, path))
                    .collect()
            }
            Err(e) => vec![Self::Error(e.to_string())],
        }
    }
}

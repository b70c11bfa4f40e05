//! Configuration types for directory watching.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default directory scanned for new files.
pub const DEFAULT_WATCH_DIR: &str = "/mnt/data/nzbs";

/// Default file name suffix that marks a candidate.
pub const DEFAULT_EXTENSION: &str = ".nzb";

/// Configuration for the watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory to watch. Only its direct children are considered.
    pub dir: PathBuf,

    /// Literal suffix a file name must end with, e.g. `.nzb`.
    pub extension: String,
}

impl WatchConfig {
    /// Create a config for `dir` with the default extension.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Set the extension filter.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Check whether a path's file name ends with the watched extension.
    ///
    /// The comparison is an exact, case-sensitive suffix match. Paths without
    /// a file name component (e.g. `/` or `..`) never match.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extension.is_empty() {
            return false;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.extension))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WATCH_DIR)
    }
}

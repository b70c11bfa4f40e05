//! One-time backlog scan of the watched directory.

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::event::CandidatePath;

/// List every matching file currently in the watched directory.
///
/// Only direct children are considered and entries come back in directory
/// listing order. Directories are skipped even if their name matches. Any
/// error reading the directory is returned.
pub fn scan_backlog(config: &WatchConfig) -> Result<Vec<CandidatePath>> {
    let start = std::time::Instant::now();
    let mut backlog = Vec::new();

    let walker = WalkDir::new(&config.dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;

        if entry.file_type().is_dir() {
            continue;
        }

        if config.matches(entry.path()) {
            debug!("Backlog candidate: {}", entry.path().display());
            backlog.push(CandidatePath::new(entry.into_path()));
        }
    }

    info!(
        "Found {} backlog file(s) in {} in {:?}",
        backlog.len(),
        config.dir.display(),
        start.elapsed()
    );

    Ok(backlog)
}

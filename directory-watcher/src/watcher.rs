//! Unified candidate stream: backlog first, then live create events.

use std::collections::VecDeque;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};
use crate::event::{CandidatePath, WatchEvent, WatchEventKind};
use crate::scan::scan_backlog;

/// Capacity of the channel between the notify thread and the async consumer.
///
/// When it fills up the notify thread blocks instead of dropping events.
const EVENT_BUFFER: usize = 1000;

/// Lazy stream of candidate paths for one directory.
///
/// The stream replays the backlog found at [`CandidateSource::open`] and then
/// forwards every matching create event. It ends only when the notification
/// channel closes, i.e. after [`CandidateSource::stop_watching`] once all
/// pending events were drained.
pub struct CandidateSource {
    /// Configuration.
    config: WatchConfig,

    /// Files found by the initial scan, not yet yielded.
    backlog: VecDeque<CandidatePath>,

    /// Events from the notify thread.
    events: mpsc::Receiver<WatchEvent>,

    /// Internal notify watcher; dropping it closes `events`.
    watcher: Option<RecommendedWatcher>,
}

impl CandidateSource {
    /// Start watching `config.dir` and scan its current contents.
    ///
    /// The watch is registered before the directory is listed so a file that
    /// arrives in between is still reported (possibly twice).
    pub fn open(config: WatchConfig) -> Result<Self> {
        validate(&config)?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                for event in WatchEvent::from_notify(res) {
                    if event_tx.blocking_send(event).is_err() {
                        debug!("Candidate source closed, discarding watch event");
                        return;
                    }
                }
            },
        )?;

        watcher.watch(&config.dir, RecursiveMode::NonRecursive)?;
        debug!("Started watching: {}", config.dir.display());

        let backlog = scan_backlog(&config)?;

        info!(
            "Watching directory {} for files with extension {}",
            config.dir.display(),
            config.extension
        );

        Ok(Self {
            config,
            backlog: backlog.into(),
            events: event_rx,
            watcher: Some(watcher),
        })
    }

    /// Build a source from an already collected backlog and an event channel.
    ///
    /// No OS watch is installed; the stream ends when every sender of
    /// `events` is dropped.
    pub fn from_channel(
        config: WatchConfig,
        backlog: Vec<CandidatePath>,
        events: mpsc::Receiver<WatchEvent>,
    ) -> Self {
        Self {
            config,
            backlog: backlog.into(),
            events,
            watcher: None,
        }
    }

    /// Yield the next candidate, waiting for live events once the backlog is
    /// exhausted. Returns `None` when the notification channel is closed.
    pub async fn next(&mut self) -> Option<CandidatePath> {
        if let Some(candidate) = self.backlog.pop_front() {
            return Some(candidate);
        }

        loop {
            match self.events.recv().await? {
                WatchEvent::Change {
                    kind: WatchEventKind::Created,
                    path,
                } if self.config.matches(&path) && !path.is_dir() => {
                    info!("New file: {}", path.display());
                    return Some(CandidatePath::new(path));
                }
                WatchEvent::Change { kind, path } => {
                    debug!("Ignoring {kind:?} event for {}", path.display());
                }
                WatchEvent::Error(e) => {
                    warn!("Watch error: {e}");
                }
            }
        }
    }

    /// Stop the OS watch. Events already queued are still delivered, then
    /// [`CandidateSource::next`] returns `None`.
    pub fn stop_watching(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.config.dir) {
                debug!("Failed to remove watch on {}: {e}", self.config.dir.display());
            }
            info!("Directory watcher stopped");
        }
    }

    /// Whether the OS watch is still installed.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Number of backlog entries not yet yielded.
    pub fn pending_backlog(&self) -> usize {
        self.backlog.len()
    }

    /// The configuration this source was opened with.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }
}

fn validate(config: &WatchConfig) -> Result<()> {
    if config.extension.is_empty() {
        return Err(WatcherError::Config("extension must not be empty".to_string()));
    }

    if !config.dir.exists() {
        return Err(WatcherError::DirectoryNotFound(
            config.dir.display().to_string(),
        ));
    }

    if !config.dir.is_dir() {
        return Err(WatcherError::NotADirectory(config.dir.display().to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn candidates(paths: &[&str]) -> Vec<CandidatePath> {
        paths.iter().map(|p| CandidatePath::new(*p)).collect()
    }

    #[tokio::test]
    async fn test_backlog_precedes_live_events() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = CandidateSource::from_channel(
            WatchConfig::new("/data"),
            candidates(&["/data/old1.nzb", "/data/old2.nzb"]),
            rx,
        );

        tx.send(WatchEvent::change(WatchEventKind::Created, "/data/new.nzb"))
            .await
            .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(candidate) = source.next().await {
            seen.push(candidate);
        }

        assert_eq!(
            seen,
            candidates(&["/data/old1.nzb", "/data/old2.nzb", "/data/new.nzb"])
        );
    }

    #[tokio::test]
    async fn test_filters_kind_and_extension() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = CandidateSource::from_channel(WatchConfig::new("/data"), Vec::new(), rx);

        for event in [
            WatchEvent::change(WatchEventKind::Created, "/data/skip.txt"),
            WatchEvent::change(WatchEventKind::Modified, "/data/skip.nzb"),
            WatchEvent::change(WatchEventKind::Removed, "/data/skip2.nzb"),
            WatchEvent::change(WatchEventKind::Created, "/data/keep.nzb"),
        ] {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        assert_eq!(source.next().await, Some(CandidatePath::new("/data/keep.nzb")));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_error_events_do_not_end_stream() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = CandidateSource::from_channel(WatchConfig::new("/data"), Vec::new(), rx);

        tx.send(WatchEvent::Error("inotify queue overflow".to_string()))
            .await
            .unwrap();
        tx.send(WatchEvent::change(WatchEventKind::Created, "/data/after.nzb"))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(source.next().await, Some(CandidatePath::new("/data/after.nzb")));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_open_nonexistent_directory() {
        let result = CandidateSource::open(WatchConfig::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.nzb");
        File::create(&file).unwrap();

        let result = CandidateSource::open(WatchConfig::new(&file));
        assert!(matches!(result, Err(WatcherError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_open_replays_backlog_then_stops() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("queued.nzb")).unwrap();
        File::create(temp_dir.path().join("ignored.txt")).unwrap();

        let mut source = CandidateSource::open(WatchConfig::new(temp_dir.path())).unwrap();
        assert!(source.is_watching());
        assert_eq!(source.pending_backlog(), 1);

        let first = source.next().await.unwrap();
        assert_eq!(
            first.as_path().file_name(),
            Some(std::ffi::OsStr::new("queued.nzb"))
        );

        source.stop_watching();
        assert!(!source.is_watching());

        let end = tokio::time::timeout(Duration::from_secs(5), source.next())
            .await
            .unwrap();
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_live_create_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = CandidateSource::open(WatchConfig::new(temp_dir.path())).unwrap();

        File::create(temp_dir.path().join("fresh.txt")).unwrap();
        File::create(temp_dir.path().join("fresh.nzb")).unwrap();

        let candidate = tokio::time::timeout(Duration::from_secs(10), source.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            candidate.as_path().file_name(),
            Some(std::ffi::OsStr::new("fresh.nzb"))
        );
    }

    #[tokio::test]
    async fn test_renamed_in_files_are_reported() {
        let root = TempDir::new().unwrap();
        let watched = root.path().join("watched");
        let staging = root.path().join("staging");
        std::fs::create_dir(&watched).unwrap();
        std::fs::create_dir(&staging).unwrap();
        File::create(staging.join("moved.nzb")).unwrap();
        File::create(watched.join("dl.nzb.part")).unwrap();

        let mut source = CandidateSource::open(WatchConfig::new(&watched)).unwrap();
        assert_eq!(source.pending_backlog(), 0);

        std::fs::rename(staging.join("moved.nzb"), watched.join("moved.nzb")).unwrap();
        std::fs::rename(watched.join("dl.nzb.part"), watched.join("dl.nzb")).unwrap();

        let mut names = Vec::new();
        for _ in 0..2 {
            let candidate = tokio::time::timeout(Duration::from_secs(10), source.next())
                .await
                .unwrap()
                .unwrap();
            names.push(
                candidate
                    .as_path()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        names.sort();
        assert_eq!(names, vec!["dl.nzb", "moved.nzb"]);

        let duplicate = tokio::time::timeout(Duration::from_millis(500), source.next()).await;
        assert!(duplicate.is_err(), "rename reported twice: {duplicate:?}");
    }
}

//! notify wrapper and the watched-file registry.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};

use dashmap::DashMap;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Mapping from watched absolute file path to the URL path that should be
/// notified when it changes.
///
/// Grows monotonically as new asset requests arrive; entries are never
/// removed during a run.
#[derive(Default)]
pub struct WatchedFiles {
    map: DashMap<PathBuf, String>,
}

impl WatchedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path -> URL mapping. Returns `true` when the path was not
    /// yet tracked (the caller should start watching it).
    pub fn register(&self, path: PathBuf, url: String) -> bool {
        let mut inserted = false;
        self.map.entry(path).or_insert_with(|| {
            inserted = true;
            url
        });
        inserted
    }

    /// The URL path registered for a file, if any.
    pub fn url_for(&self, path: &Path) -> Option<String> {
        self.map.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Handle to the notify watcher. Watches are per-file and non-recursive;
/// new paths are added dynamically as requests arrive.
pub struct FileWatcher {
    inner: parking_lot::Mutex<RecommendedWatcher>,
}

impl FileWatcher {
    /// Create the watcher and the raw event receiver.
    ///
    /// The watcher starts immediately; events buffer in the channel until
    /// the watch loop drains them.
    pub fn new() -> notify::Result<(Self, Receiver<notify::Result<notify::Event>>)> {
        let (notify_tx, notify_rx) = channel();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        Ok((
            Self {
                inner: parking_lot::Mutex::new(watcher),
            },
            notify_rx,
        ))
    }

    /// Begin watching a single file.
    pub fn watch_file(&self, path: &Path) -> notify::Result<()> {
        self.inner.lock().watch(path, RecursiveMode::NonRecursive)
    }
}

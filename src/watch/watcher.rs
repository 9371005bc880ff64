// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::types::HashStorageMode;
use crate::watch::event_handler::{process_file_change, HashFilter};
use crate::watch::hash::{FileHashStore, HashStore, MemoryHashStore};
use crate::watch::path_utils::collapse_nested;
use crate::watch::patterns::BindingWatchProfile;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    dirs: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories subscribed to, after collapsing nested ones.
    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

/// Only content-affecting events trigger rebuilds.
fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Subscribe to the base directories of every binding's patterns and send
/// `RuntimeEvent::BindingTriggered` for bindings whose patterns match a
/// changed path.
///
/// - `root` is the project directory all patterns are relative to.
/// - A base directory that does not exist is a `WatcherSubscription` error.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<BindingWatchProfile>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    hash_storage_mode: HashStorageMode,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let dirs = collapse_nested(
        profiles
            .iter()
            .flat_map(|p| p.base_dirs().iter().map(|d| root.join(d)))
            .collect(),
    );

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| PipelineError::WatcherSubscription {
        path: root.clone(),
        message: e.to_string(),
    })?;

    for dir in &dirs {
        if !fs.is_dir(dir) {
            return Err(PipelineError::WatcherSubscription {
                path: dir.clone(),
                message: "directory does not exist".to_string(),
            });
        }
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| PipelineError::WatcherSubscription {
                path: dir.clone(),
                message: e.to_string(),
            })?;
        debug!(dir = %dir.display(), "subscribed");
    }
    info!(dirs = dirs.len(), "file watcher started under {:?}", root);

    let mut store: Box<dyn HashStore> = match hash_storage_mode {
        HashStorageMode::File => Box::new(FileHashStore::new(root.clone(), Arc::clone(&fs))),
        HashStorageMode::Memory => Box::new(MemoryHashStore::new()),
    };
    let active: Vec<&str> = profiles.iter().map(|p| p.name()).collect();
    if let Err(e) = store.prune(&active) {
        warn!("failed to prune stale hashes: {}", e);
    }
    let hash_filter = HashFilter::new(store);

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                let open = process_file_change(
                    Arc::clone(&fs),
                    &async_root,
                    path,
                    &profiles,
                    &runtime_tx,
                    &hash_filter,
                )
                .await;
                if !open {
                    debug!("runtime gone; watcher event loop stopping");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        dirs,
    })
}

// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::hash::{compute_aggregate_hash, HashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, BindingWatchProfile};

/// Shared state of the hash filter.
#[derive(Clone)]
pub struct HashFilter {
    pub store: Arc<Mutex<Box<dyn HashStore>>>,
    pub cache: Arc<Mutex<FileCache>>,
}

impl HashFilter {
    pub fn new(store: Box<dyn HashStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cache: Arc::new(Mutex::new(FileCache::new())),
        }
    }
}

/// Bindings whose watch sets contain `rel_path`.
pub fn matching_bindings<'a>(
    profiles: &'a [BindingWatchProfile],
    rel_path: &str,
) -> Vec<&'a BindingWatchProfile> {
    profiles.iter().filter(|p| p.matches(rel_path)).collect()
}

/// Process a single changed path and trigger every binding that watches it.
///
/// Bindings with `use_hash` are skipped when the aggregate hash of their
/// watched files is unchanged.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_file_change(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    path: &Path,
    profiles: &[BindingWatchProfile],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hash_filter: &HashFilter,
) -> bool {
    let Some(rel_str) = relative_str(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return true;
    };

    for profile in matching_bindings(profiles, &rel_str) {
        if profile.use_hash()
            && !content_changed(Arc::clone(&fs), root, path, &rel_str, profile, hash_filter).await
        {
            continue;
        }

        debug!(binding = profile.name(), path = %rel_str, "watch match -> triggering binding");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::BindingTriggered {
                binding: profile.binding(),
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::BindingTriggered: {err}");
            return false;
        }
    }
    true
}

/// Whether the watched content of `profile` changed since the last stored
/// hash. Any error while hashing counts as a change.
async fn content_changed(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    abs_path: &Path,
    rel_path: &str,
    profile: &BindingWatchProfile,
    hash_filter: &HashFilter,
) -> bool {
    let root = root.to_path_buf();
    let abs_path = abs_path.to_path_buf();
    let rel_path = rel_path.to_string();
    let profile = profile.clone();
    let filter = hash_filter.clone();

    tokio::task::spawn_blocking(move || {
        let name = profile.name();
        let files = match collect_matching_files(fs.as_ref(), &root, &profile) {
            Ok(f) => f,
            Err(err) => {
                warn!(binding = name, error = %err, "failed to collect watched files; triggering anyway");
                return true;
            }
        };

        let mut hashes = Vec::with_capacity(files.len());
        {
            let Ok(mut cache) = filter.cache.lock() else {
                warn!("file cache mutex poisoned; triggering anyway");
                return true;
            };
            cache.invalidate(&abs_path);
            for file in &files {
                match cache.get_or_compute(fs.as_ref(), file) {
                    Ok(h) => hashes.push(h),
                    Err(err) => {
                        warn!(binding = name, file = ?file, error = %err, "failed to hash file; triggering anyway");
                        return true;
                    }
                }
            }
        }
        let new_hash = compute_aggregate_hash(&hashes);

        let Ok(mut store) = filter.store.lock() else {
            warn!(binding = name, "hash store mutex poisoned; triggering anyway");
            return true;
        };
        match store.load(name) {
            Ok(Some(old)) if old == new_hash => {
                info!(binding = name, path = %rel_path, "watched content unchanged; skipping rebuild");
                false
            }
            Ok(_) => {
                if let Err(err) = store.save(name, &new_hash) {
                    warn!(binding = name, error = %err, "failed to save binding hash");
                }
                true
            }
            Err(err) => {
                warn!(binding = name, error = %err, "failed to load binding hash; triggering anyway");
                true
            }
        }
    })
    .await
    .unwrap_or(true)
}

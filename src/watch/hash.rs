// src/watch/hash.rs

//! Content hashes for the `use_hash` trigger filter.
//!
//! A binding with `use_hash = true` is only triggered when the blake3
//! aggregate over all of its watched files differs from the last stored
//! value. Keys are binding names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

use crate::fs::FileSystem;

/// Relative path (from the project directory) to the hashes file.
pub const HASH_FILE_PATH: &str = ".assetpipe/hashes";

fn hash_file_path(root: &Path) -> PathBuf {
    root.join(HASH_FILE_PATH)
}

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut reader = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut hasher = Hasher::new();
    std::io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("hashing {:?}", path))?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute aggregate hash from a list of file hashes.
///
/// `hashes` must be sorted by the corresponding file path to ensure stability.
pub fn compute_aggregate_hash(hashes: &[String]) -> String {
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Abstract storage for binding hashes.
pub trait HashStore: Send + Sync {
    fn load(&self, binding: &str) -> Result<Option<String>>;
    fn save(&mut self, binding: &str, hash: &str) -> Result<()>;
    /// Remove hashes for bindings that are not in `active`.
    fn prune(&mut self, active: &[&str]) -> Result<()>;
}

/// Stores hashes in `<root>/.assetpipe/hashes`, one `name hash` per line.
pub struct FileHashStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileHashStore {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { root, fs }
    }

    fn load_all(&self) -> Result<BTreeMap<String, String>> {
        let path = hash_file_path(&self.root);
        if !self.fs.exists(&path) {
            return Ok(BTreeMap::new());
        }
        let text = self
            .fs
            .read_to_string(&path)
            .with_context(|| format!("reading hash file at {:?}", path))?;

        Ok(text
            .lines()
            .filter_map(|line| line.trim().split_once(char::is_whitespace))
            .map(|(name, hash)| (name.to_string(), hash.trim().to_string()))
            .collect())
    }

    fn save_all(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let path = hash_file_path(&self.root);
        let mut out = String::new();
        for (name, hash) in map {
            out.push_str(name);
            out.push(' ');
            out.push_str(hash);
            out.push('\n');
        }
        self.fs
            .write(&path, out.as_bytes())
            .with_context(|| format!("writing hash file at {:?}", path))
    }
}

impl HashStore for FileHashStore {
    fn load(&self, binding: &str) -> Result<Option<String>> {
        Ok(self.load_all()?.get(binding).cloned())
    }

    fn save(&mut self, binding: &str, hash: &str) -> Result<()> {
        let mut map = self.load_all()?;
        map.insert(binding.to_string(), hash.to_string());
        self.save_all(&map)?;
        debug!(binding, hash, "stored binding hash (file)");
        Ok(())
    }

    fn prune(&mut self, active: &[&str]) -> Result<()> {
        let mut map = self.load_all()?;
        let initial_len = map.len();
        map.retain(|k, _| active.contains(&k.as_str()));

        if map.len() < initial_len {
            self.save_all(&map)?;
            info!(removed = initial_len - map.len(), "pruned stale binding hashes (file)");
        }
        Ok(())
    }
}

/// Stores hashes in memory only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: BTreeMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, binding: &str) -> Result<Option<String>> {
        Ok(self.map.get(binding).cloned())
    }

    fn save(&mut self, binding: &str, hash: &str) -> Result<()> {
        self.map.insert(binding.to_string(), hash.to_string());
        debug!(binding, hash, "stored binding hash (memory)");
        Ok(())
    }

    fn prune(&mut self, active: &[&str]) -> Result<()> {
        self.map.retain(|k, _| active.contains(&k.as_str()));
        Ok(())
    }
}

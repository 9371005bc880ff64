// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::graph::bindings::{BindingId, WatchBinding};

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Strip a leading `./` so patterns compare against project-relative paths.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p.replace('\\', "/")
}

/// True if `pattern` names exactly one path (no glob metacharacters).
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains(GLOB_META)
}

/// Directory prefix of a pattern that contains no metacharacters.
///
/// `src/images/**/*.png` -> `src/images`, `src/js/app.js` -> `src/js`.
/// Output files are written relative to this base.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = normalize_pattern(pattern);
    let mut base = PathBuf::new();
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len().saturating_sub(1);

    for (i, seg) in segments.iter().enumerate() {
        if i == last || seg.contains(GLOB_META) {
            break;
        }
        base.push(seg);
    }
    base
}

/// Compile one pattern; `*` never crosses a `/`.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let normalized = normalize_pattern(pattern);
    let glob = GlobBuilder::new(&normalized)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Build a GlobSet from string patterns with the same separator rules as
/// [`compile_glob`].
pub fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let normalized = normalize_pattern(pat.as_ref());
        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {}", pat.as_ref()))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Compiled watch patterns for a single binding.
///
/// The patterns are relative to the project directory; the watcher passes
/// relative paths (e.g. `"src/scss/main.scss"`) into `matches`.
#[derive(Clone)]
pub struct BindingWatchProfile {
    binding: BindingId,
    name: String,
    watch_set: GlobSet,
    base_dirs: Vec<PathBuf>,
    use_hash: bool,
}

impl fmt::Debug for BindingWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingWatchProfile")
            .field("binding", &self.binding)
            .field("name", &self.name)
            .field("base_dirs", &self.base_dirs)
            .finish_non_exhaustive()
    }
}

impl BindingWatchProfile {
    pub fn binding(&self) -> BindingId {
        self.binding
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directories (relative to the project) that must be subscribed to.
    pub fn base_dirs(&self) -> &[PathBuf] {
        &self.base_dirs
    }

    /// Whether this binding only triggers when watched content changed.
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path)
    }
}

/// Build one profile per binding from the classes it groups.
pub fn build_binding_profiles(
    cfg: &ConfigFile,
    bindings: &[WatchBinding],
) -> Result<Vec<BindingWatchProfile>> {
    let default_use_hash = cfg.watch().use_hash;
    let mut profiles = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let mut patterns = Vec::new();
        let mut use_hash = false;

        for class in binding.classes() {
            let Some(spec) = cfg.asset(*class) else {
                continue;
            };
            patterns.extend(spec.watch_patterns().map(normalize_pattern));
            use_hash |= spec.effective_use_hash(default_use_hash);
        }

        let watch_set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for binding {}", binding.name()))?;

        let mut base_dirs: Vec<PathBuf> = patterns.iter().map(|p| glob_base(p)).collect();
        base_dirs.sort();
        base_dirs.dedup();

        profiles.push(BindingWatchProfile {
            binding: binding.id(),
            name: binding.name().to_string(),
            watch_set,
            base_dirs,
            use_hash,
        });
    }

    Ok(profiles)
}

/// Collect all files under `root` that match this binding's watch patterns.
///
/// Used when computing aggregated hashes for `use_hash = true` bindings.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &BindingWatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for base in profile.base_dirs() {
        let dir = root.join(base);
        if !fs.is_dir(&dir) {
            continue;
        }
        for path in walk_files(fs, &dir)? {
            if let Ok(rel) = path.strip_prefix(root) {
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if profile.matches(&rel_str) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Every regular file below `dir`, depth-first.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

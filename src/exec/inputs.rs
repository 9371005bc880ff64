// src/exec/inputs.rs

//! Resolves a class's `source` patterns into ordered transform inputs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::{AssetSpec, ConfigFile};
use crate::fs::FileSystem;
use crate::transform::SourceFile;
use crate::watch::patterns::{build_globset, compile_glob, glob_base, is_literal, walk_files};

/// Project-relative, forward-slash form of `path`.
fn project_relative(project_dir: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(project_dir)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Files matching `spec.source`, in order:
///
/// - patterns are visited in the order they are listed;
/// - a literal path contributes that file, a glob contributes its matches
///   sorted by path;
/// - a file matched twice is kept at its first position;
/// - files matching `spec.exclude` are dropped.
pub fn collect_inputs(fs: &dyn FileSystem, cfg: &ConfigFile, spec: &AssetSpec) -> Result<Vec<SourceFile>> {
    let excludes = build_globset(&spec.exclude)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut inputs = Vec::new();

    for pattern in &spec.source {
        let base_rel = glob_base(pattern);
        let base = cfg.resolve(&base_rel);

        let mut matched: Vec<PathBuf> = if is_literal(pattern) {
            let path = cfg.resolve(pattern);
            if fs.is_file(&path) {
                vec![path]
            } else {
                warn!(class = %spec.class, path = %pattern, "listed source file does not exist");
                Vec::new()
            }
        } else if fs.is_dir(&base) {
            let matcher = compile_glob(pattern)?;
            walk_files(fs, &base)?
                .into_iter()
                .filter(|p| {
                    project_relative(cfg.project_dir(), p).is_some_and(|rel| matcher.is_match(&rel))
                })
                .collect()
        } else {
            Vec::new()
        };
        matched.sort();

        for path in matched {
            let excluded = project_relative(cfg.project_dir(), &path)
                .is_some_and(|rel| excludes.is_match(&rel));
            if excluded || !seen.insert(path.clone()) {
                continue;
            }
            let rel = path
                .strip_prefix(&base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
            let contents = fs.read(&path)?;
            inputs.push(SourceFile {
                path,
                rel,
                contents,
            });
        }
    }

    debug!(class = %spec.class, inputs = inputs.len(), "collected transform inputs");
    Ok(inputs)
}

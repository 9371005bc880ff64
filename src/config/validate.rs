// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::config::model::{
    default_assets, AssetConfig, AssetSpec, ConfigFile, PathsSection, RawConfigFile,
    ReleaseSection, TransformKind, TransformSpec,
};
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::graph::bindings::group_classes;
use crate::types::AssetClass;
use crate::watch::patterns::{
    build_globset, compile_glob, glob_base, is_literal, normalize_pattern, walk_files,
};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_roots(&raw.paths)?;
        validate_release(&raw.release)?;

        let raw_assets = raw.asset.clone().unwrap_or_else(default_assets);
        let assets = resolve_assets(&raw_assets)?;

        validate_destinations(&raw.paths, &assets)?;
        validate_source_patterns(&assets)?;
        validate_binding_nesting(&assets)?;

        let paths = PathsSection {
            dev_root: normalize_dir(&raw.paths.dev_root.to_string_lossy()),
            release_root: normalize_dir(&raw.paths.release_root.to_string_lossy()),
        };

        Ok(ConfigFile::new_unchecked(
            paths,
            raw.server,
            raw.watch,
            raw.release,
            assets,
        ))
    }
}

fn config_err(msg: impl Into<String>) -> PipelineError {
    PipelineError::Config(msg.into())
}

/// Normalise a user-supplied relative directory (`./build/` -> `build`).
fn normalize_dir(raw: &str) -> PathBuf {
    Path::new(&normalize_pattern(raw))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn is_project_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn validate_roots(paths: &PathsSection) -> Result<()> {
    let dev = normalize_dir(&paths.dev_root.to_string_lossy());
    let release = normalize_dir(&paths.release_root.to_string_lossy());

    for (name, root) in [("dev_root", &dev), ("release_root", &release)] {
        if root.as_os_str().is_empty() || !is_project_relative(root) {
            return Err(config_err(format!(
                "[paths].{name} must be a non-empty path inside the project (got {root:?})"
            )));
        }
    }

    if dev.starts_with(&release) || release.starts_with(&dev) {
        return Err(config_err(format!(
            "[paths].dev_root {dev:?} and release_root {release:?} must be disjoint directories"
        )));
    }

    Ok(())
}

fn validate_release(release: &ReleaseSection) -> Result<()> {
    for pattern in &release.purge_safelist {
        Regex::new(pattern).map_err(|e| {
            config_err(format!("invalid [release].purge_safelist regex {pattern:?}: {e}"))
        })?;
    }
    build_globset(&release.purge_content)
        .map_err(|e| config_err(format!("invalid [release].purge_content: {e:#}")))?;
    Ok(())
}

fn resolve_assets(raw: &BTreeMap<String, AssetConfig>) -> Result<BTreeMap<AssetClass, AssetSpec>> {
    if raw.is_empty() {
        return Err(config_err(
            "config must contain at least one [asset.<class>] section",
        ));
    }

    let mut assets = BTreeMap::new();
    for (name, asset) in raw {
        let class: AssetClass = name.parse().map_err(config_err)?;
        let spec = resolve_asset(class, asset)?;
        assets.insert(class, spec);
    }
    Ok(assets)
}

fn resolve_asset(class: AssetClass, raw: &AssetConfig) -> Result<AssetSpec> {
    if raw.source.is_empty() {
        return Err(config_err(format!(
            "[asset.{class}].source must list at least one pattern"
        )));
    }

    let kind = raw.transform.unwrap_or_else(|| TransformKind::default_for(class));
    let transform = match kind {
        TransformKind::Include => TransformSpec::Include,
        TransformKind::Sass => TransformSpec::Sass,
        TransformKind::Script => TransformSpec::Script,
        TransformKind::Image => TransformSpec::Image,
        TransformKind::Copy => TransformSpec::Copy,
        TransformKind::Concat => {
            let output = raw.output.clone().filter(|o| !o.trim().is_empty()).ok_or_else(|| {
                config_err(format!(
                    "[asset.{class}] uses transform \"concat\" and needs an `output` file name"
                ))
            })?;
            TransformSpec::Concat { output }
        }
        TransformKind::Command => {
            let command = raw.command.clone().filter(|c| !c.trim().is_empty()).ok_or_else(|| {
                config_err(format!(
                    "[asset.{class}] uses transform \"command\" and needs a `command`"
                ))
            })?;
            TransformSpec::Command { command }
        }
    };

    let normalize_all = |patterns: &[String]| -> Vec<String> {
        patterns.iter().map(|p| normalize_pattern(p)).collect()
    };

    let spec = AssetSpec {
        class,
        source: normalize_all(&raw.source),
        watch: normalize_all(&raw.watch),
        exclude: normalize_all(&raw.exclude),
        dev_dest: normalize_dir(&raw.dev_dest),
        release_dest: normalize_dir(&raw.release_dest),
        clean: normalize_pattern(&raw.clean),
        transform,
        use_hash: raw.use_hash,
    };

    for pattern in spec.source.iter().chain(&spec.watch).chain(&spec.exclude) {
        if !is_project_relative(Path::new(pattern.as_str())) {
            return Err(config_err(format!(
                "[asset.{class}] pattern {pattern:?} must be relative to the project"
            )));
        }
    }

    for (field, patterns) in [
        ("source", &spec.source),
        ("watch", &spec.watch),
        ("exclude", &spec.exclude),
    ] {
        build_globset(patterns)
            .map_err(|e| config_err(format!("[asset.{class}].{field}: {e:#}")))?;
    }

    if spec.clean.is_empty() {
        return Err(config_err(format!("[asset.{class}].clean must not be empty")));
    }
    build_globset(std::slice::from_ref(&spec.clean))
        .map_err(|e| config_err(format!("[asset.{class}].clean: {e:#}")))?;

    Ok(spec)
}

fn validate_destinations(
    paths: &PathsSection,
    assets: &BTreeMap<AssetClass, AssetSpec>,
) -> Result<()> {
    let dev_root = normalize_dir(&paths.dev_root.to_string_lossy());
    let release_root = normalize_dir(&paths.release_root.to_string_lossy());

    for (class, spec) in assets {
        if !is_project_relative(&spec.dev_dest) || !spec.dev_dest.starts_with(&dev_root) {
            return Err(config_err(format!(
                "[asset.{class}].dev_dest {:?} must be inside dev_root {dev_root:?}",
                spec.dev_dest
            )));
        }
        if !is_project_relative(&spec.release_dest)
            || !spec.release_dest.starts_with(&release_root)
        {
            return Err(config_err(format!(
                "[asset.{class}].release_dest {:?} must be inside release_root {release_root:?}",
                spec.release_dest
            )));
        }
        if spec.dev_dest.starts_with(&spec.release_dest)
            || spec.release_dest.starts_with(&spec.dev_dest)
        {
            return Err(config_err(format!(
                "[asset.{class}] dev and release destinations must be distinct subtrees"
            )));
        }
    }

    Ok(())
}

/// Reject configurations where two classes obviously claim the same files.
///
/// Globs cannot be compared in general; this catches identical patterns and
/// literal paths matched by another class. [`check_source_overlap`] covers
/// the files actually on disk.
fn validate_source_patterns(assets: &BTreeMap<AssetClass, AssetSpec>) -> Result<()> {
    let classes: Vec<&AssetSpec> = assets.values().collect();

    for (i, a) in classes.iter().enumerate() {
        for b in classes.iter().skip(i + 1) {
            let b_set = build_globset(&b.watch_patterns().collect::<Vec<_>>())?;
            let a_set = build_globset(&a.watch_patterns().collect::<Vec<_>>())?;

            for pattern in a.watch_patterns() {
                if b.watch_patterns().any(|other| other == pattern)
                    || (is_literal(pattern) && b_set.is_match(pattern))
                {
                    return Err(config_err(format!(
                        "pattern {pattern:?} of {} overlaps the sources of {}",
                        a.class, b.class
                    )));
                }
            }
            for pattern in b.watch_patterns() {
                if is_literal(pattern) && a_set.is_match(pattern) {
                    return Err(config_err(format!(
                        "pattern {pattern:?} of {} overlaps the sources of {}",
                        b.class, a.class
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Classes in different bindings may rebuild concurrently. If one writes to
/// a directory containing another's destination, its clean pattern must stay
/// at the top level and must not match the directory leading to the other's
/// output, since matched directories are removed recursively.
fn validate_binding_nesting(assets: &BTreeMap<AssetClass, AssetSpec>) -> Result<()> {
    let groups = group_classes(assets);

    for (gi, group) in groups.iter().enumerate() {
        for outer in group {
            let outer_spec = &assets[outer];
            let shallow = !outer_spec.clean.contains('/') && !outer_spec.clean.contains("**");
            let matcher = compile_glob(&outer_spec.clean)
                .map_err(|e| config_err(format!("[asset.{outer}].clean: {e:#}")))?;

            for other in groups.iter().enumerate().filter(|(gj, _)| *gj != gi) {
                for inner in other.1 {
                    let inner_dest = &assets[inner].dev_dest;
                    let Ok(rel) = inner_dest.strip_prefix(&outer_spec.dev_dest) else {
                        continue;
                    };
                    let Some(Component::Normal(first)) = rel.components().next() else {
                        continue;
                    };
                    if !shallow || matcher.is_match(Path::new(first)) {
                        return Err(config_err(format!(
                            "[asset.{outer}].clean {:?} would delete output of {inner} in {inner_dest:?}; \
                             use a top-level pattern such as \"*.html\"",
                            outer_spec.clean
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Walk the source trees and fail if any file is matched by two classes.
pub fn check_source_overlap(fs: &dyn FileSystem, cfg: &ConfigFile) -> Result<()> {
    let mut claimed: BTreeMap<PathBuf, AssetClass> = BTreeMap::new();

    for (class, spec) in cfg.assets() {
        let patterns: Vec<&str> = spec.watch_patterns().collect();
        let set = build_globset(&patterns)?;

        let mut bases: Vec<PathBuf> = patterns.iter().map(|p| glob_base(p)).collect();
        bases.sort();
        bases.dedup();

        let mut seen_here = Vec::new();
        for base in bases {
            let dir = cfg.resolve(&base);
            if !fs.is_dir(&dir) {
                continue;
            }
            for path in walk_files(fs, &dir).map_err(|e| PipelineError::filesystem(&dir, &e))? {
                let Ok(rel) = path.strip_prefix(cfg.project_dir()) else {
                    continue;
                };
                let rel = rel.to_path_buf();
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if !set.is_match(&rel_str) || seen_here.contains(&rel) {
                    continue;
                }
                if let Some(first) = claimed.get(&rel) {
                    return Err(PipelineError::SourceOverlap {
                        path: rel,
                        first: *first,
                        second: *class,
                    });
                }
                seen_here.push(rel);
            }
        }

        debug!(class = %class, files = seen_here.len(), "claimed source files");
        for rel in seen_here {
            claimed.insert(rel, *class);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.assets().len(), AssetClass::ALL.len());
        let markup = cfg.asset(AssetClass::Markup).unwrap();
        assert_eq!(markup.dev_dest, PathBuf::from("build"));
        assert_eq!(markup.clean, "*.html");
    }

    #[test]
    fn normalizes_dot_prefixed_dirs() {
        assert_eq!(normalize_dir("./build/assets/"), PathBuf::from("build/assets"));
    }
}

// src/exec/clean.rs

use std::path::Path;

use anyhow::Result;
use globset::GlobMatcher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::patterns::compile_glob;

/// Remove every entry below `dir` whose path relative to `dir` matches
/// `pattern`. Matched directories go recursively; unmatched directories are
/// searched further. A missing `dir` is not an error, so cleaning twice is
/// the same as cleaning once.
pub fn clean(fs: &dyn FileSystem, dir: &Path, pattern: &str) -> Result<usize> {
    if !fs.is_dir(dir) {
        debug!(dir = %dir.display(), "clean: nothing to remove");
        return Ok(0);
    }
    let matcher = compile_glob(pattern)?;
    let removed = clean_dir(fs, dir, dir, &matcher)?;
    debug!(dir = %dir.display(), pattern, removed, "clean finished");
    Ok(removed)
}

fn clean_dir(fs: &dyn FileSystem, root: &Path, dir: &Path, matcher: &GlobMatcher) -> Result<usize> {
    let mut removed = 0;
    for entry in fs.read_dir(dir)? {
        let Ok(rel) = entry.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let is_dir = fs.is_dir(&entry);

        if matcher.is_match(&rel) {
            if is_dir {
                fs.remove_dir_all(&entry)?;
            } else {
                fs.remove_file(&entry)?;
            }
            removed += 1;
        } else if is_dir {
            removed += clean_dir(fs, root, &entry, matcher)?;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn build_tree() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/p/build/index.html", "i");
        fs.add_file("/p/build/about.html", "a");
        fs.add_file("/p/build/assets/css/main.css", "c");
        fs.add_file("/p/build/assets/js/app.js", "j");
        fs
    }

    #[test]
    fn shallow_pattern_leaves_subdirectories() {
        let fs = build_tree();
        clean(&fs, Path::new("/p/build"), "*.html").unwrap();

        assert!(!fs.exists(Path::new("/p/build/index.html")));
        assert!(!fs.exists(Path::new("/p/build/about.html")));
        assert!(fs.is_file(Path::new("/p/build/assets/css/main.css")));
    }

    #[test]
    fn star_empties_the_root() {
        let fs = build_tree();
        clean(&fs, Path::new("/p/build"), "*").unwrap();
        assert!(fs.read_dir(Path::new("/p/build")).unwrap().is_empty());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let fs = build_tree();
        clean(&fs, Path::new("/p/build/assets/css"), "**/*").unwrap();
        let after_first = fs.files();
        assert_eq!(clean(&fs, Path::new("/p/build/assets/css"), "**/*").unwrap(), 0);
        assert_eq!(fs.files(), after_first);
        assert_eq!(clean(&fs, Path::new("/p/missing"), "**/*").unwrap(), 0);
    }
}

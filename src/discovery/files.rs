//! Git-aware Go file discovery with parallel traversal.
//!
//! - Respects .gitignore automatically via the `ignore` crate
//! - Applies callmap.toml include/exclude patterns to root-relative paths
//! - Skips `_test.go` and generated files unless the config enables them
//! - Returns deterministic (sorted) results

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::config::Config;

const GO_EXTENSION: &str = "go";
const TEST_SUFFIX: &str = "_test.go";

/// Find Go files under `directory`, filtered by `config`.
///
/// Pattern matching uses paths relative to `root`, which is usually
/// `directory` itself. A plain file argument is returned as-is if it is a Go
/// file: explicit files bypass every other filter.
pub fn find_go_files(directory: &Path, root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if directory.is_file() {
        if is_go_file(directory) {
            return Ok(vec![directory.to_path_buf()]);
        }
        warn!(path = %directory.display(), "not a Go file, skipped");
        return Ok(vec![]);
    }

    if !directory.is_dir() {
        anyhow::bail!("Path does not exist: {}", directory.display());
    }

    // threads(0) = auto-detect based on CPU count
    let walker = WalkBuilder::new(directory)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .threads(0)
        .build_parallel();

    let files = Mutex::new(Vec::new());

    walker.run(|| {
        Box::new(|entry_result| {
            let Ok(entry) = entry_result else {
                // Unreadable entries (permissions, broken symlinks)
                return ignore::WalkState::Continue;
            };
            let path = entry.path();

            if !path.is_file() || !is_go_file(path) {
                return ignore::WalkState::Continue;
            }

            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if !config.should_include(rel_path) {
                return ignore::WalkState::Continue;
            }
            if !config.include_tests && is_test_file(path) {
                return ignore::WalkState::Continue;
            }
            if !config.include_generated && is_generated_file(path) {
                debug!(path = %rel_path.display(), "generated file skipped");
                return ignore::WalkState::Continue;
            }

            if let Ok(mut files) = files.lock() {
                files.push(path.to_path_buf());
            }
            ignore::WalkState::Continue
        })
    });

    let mut files = files
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Failed to unwrap mutex"))?;
    files.sort();
    Ok(files)
}

/// Expand a list of file and directory arguments into Go files.
///
/// The result is sorted and free of duplicates.
pub fn collect_inputs(paths: &[PathBuf], root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(find_go_files(path, root, config)?);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == GO_EXTENSION)
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEST_SUFFIX))
}

fn is_generated_file(path: &Path) -> bool {
    std::fs::read_to_string(path).is_ok_and(|source| is_generated(&source))
}

/// The `// Code generated ... DO NOT EDIT.` marker, which must appear before
/// the package clause.
pub fn is_generated(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim_end();
        if line.starts_with("package ") {
            return false;
        }
        if line.starts_with("// Code generated ") && line.ends_with(" DO NOT EDIT.") {
            return true;
        }
    }
    false
}

//! Parallel, deterministic file discovery with directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip),
//!   for excluded names and, when gathering stylesheets, ignored directories
//! - Parallel entry processing via Rayon's `par_bridge`
//! - Results sorted afterwards so batches are stable between passes

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::DetectOptions;
use crate::ignore_rules::IgnoreMatcher;
use crate::selector::Dialect;

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Checks if a directory is ignored as a whole, so nothing below it is kept.
fn is_ignored_dir(entry: &walkdir::DirEntry, root: &Path, ignore: &IgnoreMatcher) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .path()
            .strip_prefix(root)
            .is_ok_and(|relative| ignore.matches_dir(relative))
}

fn has_extension(path: &Path, accept: impl Fn(&str) -> bool) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(accept)
}

/// Walk `root` and keep files accepted by `keep`. Unreadable entries are
/// logged and skipped.
fn gather_files(
    root: &Path,
    options: &DetectOptions,
    prune_ignored: Option<&IgnoreMatcher>,
    keep: impl Fn(&Path) -> bool + Sync,
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "project root is not a directory",
        ))
        .context(format!("Failed to gather files from {}", root.display()));
    }

    let excludes: HashSet<&str> = options.excluded_dirs.iter().map(String::as_str).collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        // filter_entry prunes entire subtrees before iteration
        .filter_entry(|e| {
            !is_excluded_dir(e, &excludes)
                && !prune_ignored.is_some_and(|ignore| is_ignored_dir(e, root, ignore))
        })
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                (e.file_type().is_file() && keep(path)).then(|| path.to_path_buf())
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Gathers every consumer (markup/script) file under `root`.
///
/// Excluded directories (`node_modules`, `.git`, ...) are pruned. Ignore
/// rules are not applied here; the locator filters per detection pass.
pub fn gather_candidate_files(root: &Path, options: &DetectOptions) -> Result<Vec<PathBuf>> {
    gather_files(root, options, None, |path| {
        has_extension(path, |ext| options.is_consumer_extension(ext))
    })
}

/// Gathers every stylesheet under `root` that the ignore rules keep.
///
/// Ignored directories are pruned like excluded ones, so a negated file
/// pattern cannot pull a stylesheet back out of an ignored directory.
pub fn gather_stylesheets(
    root: &Path,
    options: &DetectOptions,
    ignore: &IgnoreMatcher,
) -> Result<Vec<PathBuf>> {
    gather_files(root, options, Some(ignore), |path| {
        has_extension(path, |ext| Dialect::from_extension(ext).is_some())
            && !ignore.matches_under(root, path)
    })
}

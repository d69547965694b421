//! Project root resolution and root-level ignore file loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::CONFIG_FILE;
use crate::error::IoResultExt;

/// Ignore file read from the project root. Nested ignore files are not used.
pub const IGNORE_FILE: &str = ".gitignore";

/// Files or directories that mark a project root.
const ROOT_MARKERS: &[&str] = &[".git", "package.json", CONFIG_FILE, IGNORE_FILE];

/// Pick the workspace folder containing `path`.
///
/// With nested folders the innermost one wins. `None` when the file lives
/// outside every folder.
pub fn resolve_project_root(path: &Path, workspace_roots: &[PathBuf]) -> Option<PathBuf> {
    workspace_roots
        .iter()
        .filter(|root| path.starts_with(root))
        .max_by_key(|root| root.components().count())
        .cloned()
}

/// Find the nearest ancestor of `path` holding a project marker
/// (`.git`, `package.json`, `deadcss.toml` or `.gitignore`).
pub fn find_project_root(path: &Path) -> Option<PathBuf> {
    let start = if path.is_dir() { path } else { path.parent()? };

    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Read `<root>/.gitignore`. Missing or unreadable files yield `None`.
pub fn read_ignore_file(root: &Path) -> Option<String> {
    let path = root.join(IGNORE_FILE);
    if !path.is_file() {
        return None;
    }

    match fs::read(&path).with_path(&path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!(error = %e, "ignore file unreadable, ignoring nothing");
            None
        }
    }
}

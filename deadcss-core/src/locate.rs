//! Proximity-based candidate file selection.
//!
//! Files next to (or below) a stylesheet are assumed to be its consumers. Only
//! when none exist does the search widen, one directory level at a time, and
//! finally to the project root. Batches are produced lazily so the usage
//! scanner can stop before the wider levels are ever filtered: the root batch
//! is only read while some class is still unresolved.
//!
//! ```text
//! root/                      <- 3. root batch (last, after every level)
//! root/src/                  <- 2. walk-up batch, nearest level first
//! root/src/widgets/          <- 2. walk-up batch
//! root/src/widgets/card/     <- 1. nearby batch (textual prefix match)
//!                  card.css
//! ```

use std::path::{Path, PathBuf};

use crate::ignore_rules::IgnoreMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Nearby,
    WalkUp(usize),
    Root,
    Done,
}

/// Lazy sequence of candidate batches, nearest first. Never yields an empty batch.
#[derive(Debug)]
pub struct ProximityBatches<'a> {
    stylesheet_dir: PathBuf,
    root: PathBuf,
    candidates: &'a [PathBuf],
    ignore: &'a IgnoreMatcher,
    fallback: bool,
    levels: Vec<PathBuf>,
    stage: Stage,
}

/// Build the batch sequence for `stylesheet_path` inside `project_root`.
pub fn locate<'a>(
    stylesheet_path: &Path,
    project_root: &Path,
    candidates: &'a [PathBuf],
    ignore: &'a IgnoreMatcher,
    fallback: bool,
) -> ProximityBatches<'a> {
    let stylesheet_dir = stylesheet_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_root.to_path_buf());

    ProximityBatches {
        levels: walk_up_levels(&stylesheet_dir, project_root),
        stylesheet_dir,
        root: project_root.to_path_buf(),
        candidates,
        ignore,
        fallback,
        stage: Stage::Nearby,
    }
}

/// Directories strictly between the stylesheet's directory and the root,
/// nearest first. The stylesheet's own directory is covered by the nearby batch.
fn walk_up_levels(stylesheet_dir: &Path, root: &Path) -> Vec<PathBuf> {
    let mut levels = Vec::new();
    let mut dir = stylesheet_dir.parent();
    while let Some(d) = dir {
        if d == root || !d.starts_with(root) {
            break;
        }
        levels.push(d.to_path_buf());
        dir = d.parent();
    }
    levels
}

impl ProximityBatches<'_> {
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.matches_under(&self.root, path)
    }

    /// Candidates whose path text contains the stylesheet directory.
    ///
    /// A textual test, so `src/comp` also matches files under `src/components`.
    fn nearby(&self) -> Vec<PathBuf> {
        let dir = self.stylesheet_dir.to_string_lossy();
        self.candidates
            .iter()
            .filter(|p| p.to_string_lossy().contains(dir.as_ref()))
            .filter(|p| !self.is_ignored(p))
            .cloned()
            .collect()
    }

    /// Candidates whose direct parent is exactly `dir`.
    fn in_directory(&self, dir: &Path) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .filter(|p| p.parent() == Some(dir))
            .filter(|p| !self.is_ignored(p))
            .cloned()
            .collect()
    }
}

impl Iterator for ProximityBatches<'_> {
    type Item = Vec<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Nearby => {
                    let batch = self.nearby();
                    if !batch.is_empty() {
                        self.stage = Stage::Done;
                        return Some(batch);
                    }
                    self.stage = if self.fallback {
                        Stage::WalkUp(0)
                    } else {
                        Stage::Done
                    };
                }
                Stage::WalkUp(level) => {
                    let Some(dir) = self.levels.get(level) else {
                        self.stage = Stage::Root;
                        continue;
                    };
                    let batch = self.in_directory(dir);
                    self.stage = Stage::WalkUp(level + 1);
                    if !batch.is_empty() {
                        return Some(batch);
                    }
                }
                Stage::Root => {
                    self.stage = Stage::Done;
                    let root = self.root.clone();
                    let batch = self.in_directory(&root);
                    return (!batch.is_empty()).then_some(batch);
                }
                Stage::Done => return None,
            }
        }
    }
}

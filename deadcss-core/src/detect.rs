//! Unused class detection for one stylesheet.
//!
//! ```text
//! stylesheet text ──► extract ──► declared names
//!                                      │
//! candidate index ──► locate ──► batches ──► scan ──► used names
//!                                                        │
//!                                  declared − used ◄─────┘
//! ```
//!
//! A pass owns no state and touches nothing shared, so passes for different
//! stylesheets can run concurrently. Skips (no project root, not a
//! stylesheet, ignored path) and internal faults all come back as `None`;
//! callers keep whatever they showed before.

use std::any::Any;
use std::collections::{BTreeSet, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::DetectOptions;
use crate::error::DeadcssError;
use crate::ignore_rules::IgnoreMatcher;
use crate::locate::locate;
use crate::project::read_ignore_file;
use crate::scan::gather_candidate_files;
use crate::selector::{declared_names, extract_with_dialect, ClassDeclaration, Dialect};
use crate::usage::{CandidateFile, UsageScanner};

/// The stylesheet being checked: its path and current text (possibly unsaved).
#[derive(Debug, Clone)]
pub struct StylesheetDocument {
    pub path: PathBuf,
    pub text: String,
}

impl StylesheetDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Everything a pass needs besides the stylesheet.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    /// Project the stylesheet belongs to; `None` skips the pass.
    pub project_root: Option<&'a Path>,
    /// Every consumer file of the project, in a stable order.
    pub candidates: &'a [PathBuf],
    /// Content of the root ignore file, if any.
    pub ignore_file: Option<&'a str>,
    pub options: &'a DetectOptions,
}

/// Owned project data backing a [`DetectionContext`].
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub root: PathBuf,
    pub candidates: Vec<PathBuf>,
    pub ignore_file: Option<String>,
    pub options: DetectOptions,
}

impl ProjectSnapshot {
    /// Discover candidates and read the ignore file for `root`.
    pub fn load(root: &Path, options: DetectOptions) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            candidates: gather_candidate_files(root, &options)?,
            ignore_file: read_ignore_file(root),
            options,
        })
    }

    pub fn context(&self) -> DetectionContext<'_> {
        DetectionContext {
            project_root: Some(&self.root),
            candidates: &self.candidates,
            ignore_file: self.ignore_file.as_deref(),
            options: &self.options,
        }
    }
}

/// Full outcome of one detection pass.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub stylesheet: PathBuf,
    pub dialect: Dialect,
    pub declarations: Vec<ClassDeclaration>,
    /// Distinct class names in first-declaration order.
    pub declared: Vec<String>,
    pub used: BTreeSet<String>,
    /// `declared − used`, in first-declaration order.
    pub unused: Vec<String>,
    pub files_read: usize,
}

/// Names of `declared` missing from `used`, keeping declaration order.
pub fn unused_names(declared: &[String], used: &HashSet<String>) -> Vec<String> {
    declared
        .iter()
        .filter(|name| !used.contains(*name))
        .cloned()
        .collect()
}

/// Return the unused class names of `document`, or `None` when the pass is skipped.
pub fn detect_unused(
    document: &StylesheetDocument,
    context: &DetectionContext<'_>,
) -> Option<Vec<String>> {
    analyze(document, context).map(|report| report.unused)
}

/// Run a detection pass and keep all intermediate results.
///
/// A panic inside the pass is caught here and reported as a skip.
pub fn analyze(
    document: &StylesheetDocument,
    context: &DetectionContext<'_>,
) -> Option<DetectionReport> {
    match panic::catch_unwind(AssertUnwindSafe(|| run_pass(document, context))) {
        Ok(report) => report,
        Err(payload) => {
            let err = pass_panic(&document.path, payload.as_ref());
            error!(error = %err, "detection pass failed, keeping previous results");
            None
        }
    }
}

/// Turn a caught panic payload into a typed error naming the stylesheet.
fn pass_panic(stylesheet: &Path, payload: &(dyn Any + Send)) -> DeadcssError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    DeadcssError::internal(format!(
        "detection pass for {} panicked: {}",
        stylesheet.display(),
        message
    ))
}

fn run_pass(document: &StylesheetDocument, context: &DetectionContext<'_>) -> Option<DetectionReport> {
    let path = document.path.as_path();

    let Some(root) = context.project_root else {
        debug!(stylesheet = %path.display(), "skipped: no project root");
        return None;
    };
    let Some(dialect) = Dialect::from_path(path) else {
        debug!(stylesheet = %path.display(), "skipped: not a stylesheet");
        return None;
    };

    let ignore = IgnoreMatcher::build(context.ignore_file);
    if ignore.matches_under(root, path) {
        debug!(stylesheet = %path.display(), "skipped: ignored");
        return None;
    }

    let declarations = extract_with_dialect(&document.text, dialect);
    let declared = declared_names(&declarations);

    let batches = locate(
        path,
        root,
        context.candidates,
        &ignore,
        context.options.enable_fallback_search,
    )
    .map(|batch| batch.into_iter().map(CandidateFile::new));
    let scan = UsageScanner::new(&declared).scan(batches);

    let unused = unused_names(&declared, &scan.used);
    debug!(
        stylesheet = %path.display(),
        declared = declared.len(),
        unused = unused.len(),
        files_read = scan.files_read,
        "detection pass complete"
    );

    Some(DetectionReport {
        stylesheet: path.to_path_buf(),
        dialect,
        declarations,
        declared,
        used: scan.used.into_iter().collect(),
        unused,
        files_read: scan.files_read,
    })
}

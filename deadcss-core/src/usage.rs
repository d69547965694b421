//! Textual class usage detection in consumer files.
//!
//! A class counts as used when a line of a consumer file contains `class` or
//! `className`, then a quote, then the class name as a whole token, then a
//! quote. This is a heuristic, not markup parsing: anything may sit between
//! those parts on the same line, so an unrelated quoted attribute after
//! `class=` can produce a false positive. Dash and underscore count as part
//! of a class name, so `nav-abc` does not use `abc`.
//!
//! Performance characteristics:
//! - One pre-compiled regex per class name, built once per scan
//! - Files of a batch are read in parallel via Rayon
//! - The scan stops as soon as every class name has been seen

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::IoResultExt;

/// A consumer file whose text is loaded on first access, at most once.
#[derive(Debug)]
pub struct CandidateFile {
    path: PathBuf,
    content: OnceLock<Option<String>>,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: OnceLock::new(),
        }
    }

    /// A candidate whose text is already known (an open editor buffer).
    pub fn with_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let file = Self::new(path);
        let _ = file.content.set(Some(content.into()));
        file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decoded text, or `None` when the file could not be read.
    pub fn content(&self) -> Option<&str> {
        self.content
            .get_or_init(|| match fs::read(&self.path).with_path(&self.path) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable candidate file");
                    None
                }
            })
            .as_deref()
    }

    /// Whether the content has been requested already.
    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }
}

/// Build the usage pattern for one class name.
pub fn class_usage_regex(class_name: &str) -> Option<Regex> {
    let escaped = regex::escape(class_name);
    let pattern = format!(r#"(?:className|class).*?["'](?:.*[^\w-])?{escaped}(?:[^\w-].*)?["']"#);
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(class = %class_name, error = %e, "cannot build usage pattern");
            None
        }
    }
}

/// Whether `content` uses `class_name` according to the textual heuristic.
pub fn is_class_used(content: &str, class_name: &str) -> bool {
    class_usage_regex(class_name).is_some_and(|re| re.is_match(content))
}

/// Outcome of a usage scan.
#[derive(Debug, Clone, Default)]
pub struct UsageScan {
    /// Class names found in at least one consumer file.
    pub used: HashSet<String>,
    /// Number of candidate files whose content was requested.
    pub files_read: usize,
    /// Number of batches the scan started.
    pub batches_scanned: usize,
}

/// Scanner for a fixed set of class names.
pub struct UsageScanner {
    patterns: Vec<(String, Regex)>,
    total: usize,
}

impl UsageScanner {
    /// Compile one pattern per distinct class name.
    pub fn new(class_names: &[String]) -> Self {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = class_names
            .iter()
            .filter(|n| seen.insert(n.as_str()))
            .collect();
        let total = distinct.len();
        let patterns = distinct
            .into_iter()
            .filter_map(|name| class_usage_regex(name).map(|re| (name.clone(), re)))
            .collect();
        Self { patterns, total }
    }

    /// Consume batches in order until every class name is used or the
    /// batches run out.
    ///
    /// Within a batch files are read concurrently; the completion check runs
    /// after every file, so a satisfied scan issues no further reads and
    /// starts no further batch. Names already marked used are never tested
    /// again.
    pub fn scan<I, B>(&self, batches: I) -> UsageScan
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = CandidateFile>,
    {
        let used: Mutex<HashSet<String>> = Mutex::new(HashSet::with_capacity(self.total));
        let done = AtomicBool::new(self.total == 0);
        let files_read = AtomicUsize::new(0);
        let mut batches_scanned = 0;

        for batch in batches {
            if done.load(Ordering::Acquire) {
                break;
            }
            batches_scanned += 1;

            let files: Vec<CandidateFile> = batch.into_iter().collect();
            files.par_iter().for_each(|file| {
                if done.load(Ordering::Acquire) {
                    return;
                }
                files_read.fetch_add(1, Ordering::Relaxed);
                let Some(content) = file.content() else {
                    return;
                };

                let pending: Vec<&(String, Regex)> = {
                    let used = used.lock().unwrap_or_else(|e| e.into_inner());
                    self.patterns
                        .iter()
                        .filter(|(name, _)| !used.contains(name))
                        .collect()
                };
                let hits: Vec<&String> = pending
                    .into_iter()
                    .filter(|(_, re)| re.is_match(content))
                    .map(|(name, _)| name)
                    .collect();
                if hits.is_empty() {
                    return;
                }

                debug!(file = %file.path().display(), hits = hits.len(), "class usages found");
                let mut used = used.lock().unwrap_or_else(|e| e.into_inner());
                used.extend(hits.into_iter().cloned());
                if used.len() == self.total {
                    done.store(true, Ordering::Release);
                }
            });
        }

        UsageScan {
            used: used.into_inner().unwrap_or_else(|e| e.into_inner()),
            files_read: files_read.into_inner(),
            batches_scanned,
        }
    }
}

/// Scan `batches` for usages of `class_names`.
pub fn scan<I, B>(batches: I, class_names: &[String]) -> UsageScan
where
    I: IntoIterator<Item = B>,
    B: IntoIterator<Item = CandidateFile>,
{
    UsageScanner::new(class_names).scan(batches)
}

//! Builder pattern API for whole-project analysis.
//!
//! Provides a fluent interface for configuring and running a batch run:
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//!
//! let result = Deadcss::new("/path/to/site")
//!     .with_fallback(false)
//!     .exclude_dirs(["generated"])
//!     .analyze()?;
//!
//! for finding in &result.findings {
//!     println!("{}: {:?}", finding.stylesheet.display(), finding.unused);
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::load_detect_options;
use crate::detect::{analyze, ProjectSnapshot, StylesheetDocument};
use crate::diagnostics::{unused_rules, UnusedRule};
use crate::ignore_rules::IgnoreMatcher;
use crate::scan::gather_stylesheets;

/// Builder for configuring a project analysis.
#[derive(Debug, Clone)]
pub struct Deadcss {
    /// Project root
    root: PathBuf,

    /// Overrides `enable_fallback_search` from deadcss.toml
    fallback: Option<bool>,

    /// Only check these stylesheets; all of them when empty
    stylesheets: Vec<PathBuf>,

    /// Extra directories to prune
    excluded_dirs: Vec<String>,

    /// Dry-run mode (don't modify files)
    dry_run: bool,
}

impl Deadcss {
    /// Create a new analysis builder for the given project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fallback: None,
            stylesheets: Vec::new(),
            excluded_dirs: Vec::new(),
            dry_run: false,
        }
    }

    /// Enable or disable the walk-up/root fallback search.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = Some(enabled);
        self
    }

    /// Restrict the run to the given stylesheets (relative to the root or absolute).
    pub fn stylesheets(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.stylesheets.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Enable dry-run mode (no file modifications).
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        // 1. Resolve options
        let mut options = load_detect_options(&self.root);
        if let Some(enabled) = self.fallback {
            options.enable_fallback_search = enabled;
        }
        for dir in &self.excluded_dirs {
            if !options.excluded_dirs.contains(dir) {
                options.excluded_dirs.push(dir.clone());
            }
        }

        // 2. Discover consumers and read the ignore file
        let snapshot = ProjectSnapshot::load(&self.root, options)
            .context("Failed to gather consumer files")?;

        // 3. Pick stylesheets
        let stylesheets = if self.stylesheets.is_empty() {
            let ignore = IgnoreMatcher::build(snapshot.ignore_file.as_deref());
            gather_stylesheets(&self.root, &snapshot.options, &ignore)
                .context("Failed to gather stylesheets")?
        } else {
            self.stylesheets
                .iter()
                .map(|p| if p.is_absolute() { p.clone() } else { self.root.join(p) })
                .collect()
        };

        // 4. One independent pass per stylesheet
        let context = snapshot.context();
        let mut findings: Vec<StylesheetFindings> = stylesheets
            .par_iter()
            .filter_map(|path| {
                let text = match fs::read(path) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable stylesheet");
                        return None;
                    }
                };
                let document = StylesheetDocument::new(path.clone(), text);
                let report = analyze(&document, &context)?;
                let rules = unused_rules(&document.text, report.dialect, &report.unused);
                Some(StylesheetFindings {
                    stylesheet: report.stylesheet,
                    unused: report.unused,
                    rules,
                    files_read: report.files_read,
                })
            })
            .collect();
        findings.sort_by(|a, b| a.stylesheet.cmp(&b.stylesheet));

        let result = AnalysisResult {
            root: self.root.clone(),
            stylesheets_checked: findings.len(),
            stylesheets_skipped: stylesheets.len() - findings.len(),
            candidate_files: snapshot.candidates.len(),
            findings,
        };
        info!(
            root = %self.root.display(),
            checked = result.stylesheets_checked,
            unused = result.unused_count(),
            "analysis complete"
        );
        Ok(result)
    }

    /// Remove every flagged rule from disk.
    #[cfg(feature = "fix")]
    pub fn fix(&self, result: &AnalysisResult) -> crate::fix::FixResult {
        let files: Vec<(PathBuf, Vec<UnusedRule>)> = result
            .findings
            .iter()
            .filter(|f| !f.rules.is_empty())
            .map(|f| (f.stylesheet.clone(), f.rules.clone()))
            .collect();
        crate::fix::fix_unused_rules(&files, self.dry_run)
    }
}

/// Unused classes of one stylesheet.
#[derive(Debug, Clone, Serialize)]
pub struct StylesheetFindings {
    pub stylesheet: PathBuf,
    /// Unused class names in first-declaration order
    pub unused: Vec<String>,
    /// Every rule mentioning one of them
    pub rules: Vec<UnusedRule>,
    pub files_read: usize,
}

/// Result of running a project analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// Stylesheets a pass completed for
    pub stylesheets_checked: usize,

    /// Unreadable or ignored stylesheets
    pub stylesheets_skipped: usize,

    /// Consumer files discovered under the root
    pub candidate_files: usize,

    /// One entry per checked stylesheet, sorted by path
    pub findings: Vec<StylesheetFindings>,
}

impl AnalysisResult {
    /// Check if any unused class was found.
    pub fn has_unused(&self) -> bool {
        self.findings.iter().any(|f| !f.unused.is_empty())
    }

    /// Total count of unused class names over all stylesheets.
    pub fn unused_count(&self) -> usize {
        self.findings.iter().map(|f| f.unused.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_site() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("deadcss_builder_test")
            .join(format!("{}_{}", std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }

        for (file, content) in [
            ("index.html", "<div class=\"hero\"></div>"),
            ("site.css", ".hero {}\n.ghost {}\n"),
            ("admin/panel.html", "<p class=\"row\"></p>"),
            ("admin/admin.css", ".row {}\n"),
        ] {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Deadcss::new("/site");
        assert_eq!(builder.root(), Path::new("/site"));
        assert!(builder.fallback.is_none());
        assert!(!builder.dry_run);
    }

    #[test]
    fn test_analyze_reports_per_stylesheet() {
        let dir = create_test_site();
        let result = Deadcss::new(&dir).analyze().unwrap();

        assert_eq!(result.stylesheets_checked, 2);
        assert_eq!(result.candidate_files, 2);
        assert!(result.has_unused());
        assert_eq!(result.unused_count(), 1);

        let site = result
            .findings
            .iter()
            .find(|f| f.stylesheet.ends_with("site.css"))
            .unwrap();
        assert_eq!(site.unused, vec!["ghost"]);
        assert_eq!(site.rules[0].selector, ".ghost");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_analyze_selected_stylesheets_only() {
        let dir = create_test_site();
        let result = Deadcss::new(&dir)
            .stylesheets(["admin/admin.css"])
            .analyze()
            .unwrap();

        assert_eq!(result.findings.len(), 1);
        assert!(!result.has_unused());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_stylesheet_is_skipped() {
        let dir = create_test_site();
        let result = Deadcss::new(&dir)
            .stylesheets(["nope.css"])
            .analyze()
            .unwrap();

        assert_eq!(result.stylesheets_checked, 0);
        assert_eq!(result.stylesheets_skipped, 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "fix")]
    #[test]
    fn test_fix_removes_flagged_rules() {
        let dir = create_test_site();
        let builder = Deadcss::new(&dir);
        let result = builder.analyze().unwrap();
        let fixed = builder.fix(&result);

        assert_eq!(fixed.files_changed.len(), 1);
        assert_eq!(fs::read_to_string(dir.join("site.css")).unwrap(), ".hero {}\n\n");
        fs::remove_dir_all(&dir).ok();
    }
}

//! Gitignore-style path filtering.
//!
//! Only the project root's ignore file is honoured; nested ignore files are
//! not looked up. The matcher is a pure function of the ignore file text and
//! is rebuilt for every detection pass.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::warn;

/// Compiled ignore rules for one project.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Option<Gitignore>,
}

impl IgnoreMatcher {
    /// Compile ignore file content. `None` yields a matcher that never matches.
    ///
    /// Lines that fail to compile are skipped; the remaining rules still apply.
    pub fn build(content: Option<&str>) -> Self {
        let Some(content) = content else {
            return Self::empty();
        };

        let mut builder = GitignoreBuilder::new("");
        for line in content.lines() {
            if let Err(e) = builder.add_line(None, line) {
                warn!(pattern = %line, error = %e, "skipping invalid ignore pattern");
            }
        }

        match builder.build() {
            Ok(rules) if !rules.is_empty() => Self { rules: Some(rules) },
            Ok(_) => Self::empty(),
            Err(e) => {
                warn!(error = %e, "ignore rules failed to compile, ignoring nothing");
                Self::empty()
            }
        }
    }

    /// A matcher with no rules.
    pub fn empty() -> Self {
        Self { rules: None }
    }

    /// True if the matcher has no rules at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_none()
    }

    /// Whether a file at `relative_path` (relative to the project root) is ignored.
    ///
    /// A file inside an ignored directory is ignored as well.
    pub fn matches(&self, relative_path: &Path) -> bool {
        self.matches_entry(relative_path, false)
    }

    /// Same as [`matches`](Self::matches) for a directory path, so that
    /// directory-only patterns (`build/`) apply to the path itself.
    pub fn matches_dir(&self, relative_path: &Path) -> bool {
        self.matches_entry(relative_path, true)
    }

    /// Relativize `path` against `root` and test it. Paths outside `root`
    /// are never ignored.
    pub fn matches_under(&self, root: &Path, path: &Path) -> bool {
        if self.rules.is_none() {
            return false;
        }
        match path.strip_prefix(root) {
            Ok(relative) => self.matches(relative),
            Err(_) => false,
        }
    }

    fn matches_entry(&self, relative_path: &Path, is_dir: bool) -> bool {
        let Some(rules) = &self.rules else {
            return false;
        };
        // The gitignore matcher rejects rooted paths.
        if relative_path.has_root() || relative_path.as_os_str().is_empty() {
            return false;
        }
        rules
            .matched_path_or_any_parents(relative_path, is_dir)
            .is_ignore()
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

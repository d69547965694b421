//! Removal of unused rules, as editor edits or directly on disk.
//!
//! Features:
//! - Exact-range edits for editor quick fixes
//! - Whole-file rewriting with dry-run support
//! - Symlinked stylesheets are never rewritten

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diagnostics::UnusedRule;
use crate::error::{DeadcssError, DeadcssResult};
use crate::logging::log_error;
use crate::selector::{extract_rules, Dialect, LineIndex, SourcePosition};

/// Result of a fix operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixResult {
    pub files_changed: Vec<String>,
    pub rules_removed: Vec<String>,
    pub errors: Vec<String>,
}

/// Replacement of the text between `start` and `end` (exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub start: SourcePosition,
    pub end: SourcePosition,
    pub new_text: String,
}

/// The edit deleting exactly the rule's source range.
pub fn removal_edit(text: &str, rule: &UnusedRule) -> TextEdit {
    let index = LineIndex::new(text);
    TextEdit {
        start: index.position(rule.span.start),
        end: index.position(rule.span.end),
        new_text: String::new(),
    }
}

/// Apply one edit to `text`.
pub fn apply_edit(text: &str, edit: &TextEdit) -> DeadcssResult<String> {
    let index = LineIndex::new(text);
    let start = index
        .offset(edit.start)
        .ok_or_else(|| DeadcssError::fix(format!("start {:?} is outside the document", edit.start)))?;
    let end = index
        .offset(edit.end)
        .ok_or_else(|| DeadcssError::fix(format!("end {:?} is outside the document", edit.end)))?;
    if end < start {
        return Err(DeadcssError::fix("edit range is reversed"));
    }

    let mut out = String::with_capacity(text.len() - (end - start) + edit.new_text.len());
    out.push_str(&text[..start]);
    out.push_str(&edit.new_text);
    out.push_str(&text[end..]);
    Ok(out)
}

/// Delete the byte range `span` from `text`.
pub fn remove_span(text: &str, span: Range<usize>) -> DeadcssResult<String> {
    if span.start > span.end
        || span.end > text.len()
        || !text.is_char_boundary(span.start)
        || !text.is_char_boundary(span.end)
    {
        return Err(DeadcssError::fix(format!(
            "span {}..{} does not fit a {} byte document",
            span.start,
            span.end,
            text.len()
        )));
    }
    let mut out = String::with_capacity(text.len() - span.len());
    out.push_str(&text[..span.start]);
    out.push_str(&text[span.end..]);
    Ok(out)
}

/// Pre-compiled regex for collapsing runs of blank lines.
fn blank_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // SAFETY: This regex pattern is hardcoded and covered by tests.
    REGEX.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("Hardcoded regex pattern is valid"))
}

/// Spans to delete: outermost rules only, sorted by start.
fn outermost_spans(rules: &[UnusedRule]) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = rules.iter().map(|r| r.span.clone()).collect();
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));

    let mut out: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        if out.last().is_some_and(|last| span.start < last.end) {
            continue;
        }
        out.push(span);
    }
    out
}

/// Delete every flagged rule and tidy the blank lines left behind.
///
/// Nested rules inside a removed rule go with it.
pub fn remove_rules(text: &str, rules: &[UnusedRule]) -> DeadcssResult<String> {
    let mut out = text.to_string();
    for span in outermost_spans(rules).into_iter().rev() {
        out = remove_span(&out, span)?;
    }
    Ok(blank_line_regex().replace_all(&out, "\n\n").into_owned())
}

/// Fail unless every flagged rule still sits at the same span in `content`.
fn ensure_rules_unchanged(path: &Path, content: &str, rules: &[UnusedRule]) -> Result<()> {
    let dialect = Dialect::from_path(path)
        .ok_or_else(|| DeadcssError::fix(format!("not a stylesheet: {}", path.display())))?;
    let current = extract_rules(content, dialect);

    for rule in rules {
        let still_there = current
            .iter()
            .any(|block| block.span == rule.span && block.selector == rule.selector);
        if !still_there {
            return Err(DeadcssError::fix(format!(
                "{} changed since analysis, `{}` is no longer at {}:{}",
                path.display(),
                rule.selector,
                rule.start.line,
                rule.start.column
            ))
            .into());
        }
    }
    Ok(())
}

/// Rewrite a stylesheet without its flagged rules.
///
/// In dry-run mode, only prints what would be removed.
/// Refuses to rewrite symlinks.
pub fn fix_stylesheet(path: &Path, rules: &[UnusedRule], dry_run: bool) -> Result<bool> {
    if rules.is_empty() {
        return Ok(false);
    }

    let metadata = path
        .symlink_metadata()
        .with_context(|| format!("Failed to stat: {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        warn!(path = %path.display(), "refusing to rewrite symlinked stylesheet");
        return Ok(false);
    }

    if dry_run {
        for rule in rules {
            println!(
                "[DRY-RUN] Would remove `{}` from {}:{}",
                rule.selector,
                path.display(),
                rule.start.line
            );
        }
        return Ok(true);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    ensure_rules_unchanged(path, &content, rules)?;
    let fixed = remove_rules(&content, rules)
        .with_context(|| format!("Stylesheet changed while fixing: {}", path.display()))?;
    fs::write(path, fixed).with_context(|| format!("Failed to write: {}", path.display()))?;

    info!(path = %path.display(), rules = rules.len(), "removed unused rules");
    println!("[FIX] Removed {} rule(s) from {}", rules.len(), path.display());
    Ok(true)
}

/// Fix several stylesheets, continuing past individual failures.
pub fn fix_unused_rules(files: &[(PathBuf, Vec<UnusedRule>)], dry_run: bool) -> FixResult {
    let mut result = FixResult::default();

    for (path, rules) in files {
        match fix_stylesheet(path, rules, dry_run) {
            Ok(true) => {
                result.files_changed.push(path.display().to_string());
                result
                    .rules_removed
                    .extend(rules.iter().map(|r| format!("{}: {}", path.display(), r.selector)));
            }
            Ok(false) => {}
            Err(e) => {
                let message = format!("{}: {:#}", path.display(), e);
                log_error(&format!("fix failed for {}", message));
                result.errors.push(message);
            }
        }
    }

    result
}

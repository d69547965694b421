//! Rule-level view of a detection result, as shown to the user.
//!
//! Detection decides per class name. Rendering fans those names back out to
//! rules: every rule whose selector list contains at least one unused name is
//! reported, spanning the whole rule so a quick fix can delete it.

use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;

use crate::selector::{extract_rules, Dialect, SourcePosition};

/// Stable code attached to every diagnostic; quick fixes key on it.
pub const DIAGNOSTIC_CODE: &str = "unused-css-class";

/// Diagnostic source label.
pub const DIAGNOSTIC_SOURCE: &str = "deadcss";

/// Message carried by every diagnostic.
pub const DIAGNOSTIC_MESSAGE: &str = "Potentially unused class";

/// Title of the quick fix removing a flagged rule.
pub const FIX_TITLE: &str = "Remove unused CSS class";

/// A rule flagged because of one or more unused classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedRule {
    pub selector: String,
    /// Unused class names found in the selector, without duplicates.
    pub unused_classes: Vec<String>,
    pub start: SourcePosition,
    /// Inclusive end position.
    pub end: SourcePosition,
    /// Byte range of the rule, end exclusive.
    pub span: Range<usize>,
}

impl UnusedRule {
    /// The unused classes as `.a, .b`, for reports.
    pub fn class_list(&self) -> String {
        self.unused_classes
            .iter()
            .map(|name| format!(".{}", name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Re-parse `text` and flag every rule containing an unused class.
pub fn unused_rules(text: &str, dialect: Dialect, unused: &[String]) -> Vec<UnusedRule> {
    if unused.is_empty() {
        return Vec::new();
    }
    let unused: HashSet<&str> = unused.iter().map(String::as_str).collect();

    extract_rules(text, dialect)
        .into_iter()
        .filter_map(|rule| {
            let mut seen = HashSet::new();
            let unused_classes: Vec<String> = rule
                .class_names
                .iter()
                .filter(|name| unused.contains(name.as_str()) && seen.insert(name.as_str()))
                .cloned()
                .collect();
            if unused_classes.is_empty() {
                return None;
            }
            Some(UnusedRule {
                selector: rule.selector,
                unused_classes,
                start: rule.start,
                end: rule.end,
                span: rule.span,
            })
        })
        .collect()
}

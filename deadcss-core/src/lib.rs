//! deadcss-core: unused CSS class detection library
//!
//! This library finds class selectors declared in stylesheets that no
//! markup or script file of the project appears to reference.
//!
//! # Features
//!
//! - **Selector extraction**: `.css`, `.scss`, `.less` and indented `.sass`
//! - **Proximity search**: consumer files next to a stylesheet first, widening
//!   only when nothing is found nearby
//! - **Ignore rules**: gitignore-style patterns from the project root
//! - **Short-circuit scanning**: stops reading files once every class is used
//! - **Rule removal**: exact-range edits and on-disk fixes
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//!
//! let result = Deadcss::new("/path/to/site").analyze()?;
//!
//! for finding in &result.findings {
//!     for name in &finding.unused {
//!         println!("{}: .{}", finding.stylesheet.display(), name);
//!     }
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`selector`]: stylesheet parsing into class declarations and rules
//! - [`ignore_rules`]: gitignore-style path matching
//! - [`locate`]: proximity-ordered candidate batches
//! - [`usage`]: textual usage scan with short-circuit
//! - [`detect`]: one detection pass for one stylesheet
//! - [`diagnostics`]: rule ranges for rendering
//! - [`scan`]: parallel file discovery
//! - [`fix`]: rule removal
//! - [`builder`]: fluent builder API for whole-project runs
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `fix` (default): Enable rule removal
//! - `full`: Enable all optional features

// Core modules (always available)
pub mod builder;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod ignore_rules;
pub mod locate;
pub mod logging;
pub mod prelude;
pub mod project;
pub mod report;
pub mod scan;
pub mod selector;
pub mod usage;

// Feature-gated modules
#[cfg(feature = "fix")]
pub mod fix;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeadcssError, DeadcssResult, IoResultExt};

// Builder API
pub use builder::{AnalysisResult, Deadcss, StylesheetFindings};

// Configuration
pub use config::{load_config, load_detect_options, DeadcssConfig, DetectOptions, CONFIG_FILE};

// Core detection
pub use detect::{
    analyze, detect_unused, unused_names, DetectionContext, DetectionReport, ProjectSnapshot,
    StylesheetDocument,
};

// Rendering
pub use diagnostics::{
    unused_rules, UnusedRule, DIAGNOSTIC_CODE, DIAGNOSTIC_MESSAGE, DIAGNOSTIC_SOURCE, FIX_TITLE,
};

// Ignore rules
pub use ignore_rules::IgnoreMatcher;

// Candidate location
pub use locate::{locate, ProximityBatches};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Project layout
pub use project::{find_project_root, read_ignore_file, resolve_project_root, IGNORE_FILE};

// Reporting
pub use report::{print_json, print_plain, to_json};

// File scanning
pub use scan::{gather_candidate_files, gather_stylesheets};

// Parsing
pub use selector::{
    class_tokens, declared_names, extract, extract_rules, extract_with_dialect, ClassDeclaration,
    Dialect, LineIndex, RuleBlock, SourcePosition, STYLESHEET_EXTENSIONS,
};

// Usage scanning
pub use usage::{class_usage_regex, is_class_used, CandidateFile, UsageScan, UsageScanner};

// Feature-gated re-exports
#[cfg(feature = "fix")]
pub use fix::{
    apply_edit, fix_stylesheet, fix_unused_rules, removal_edit, remove_rules, remove_span,
    FixResult, TextEdit,
};

#[cfg(test)]
mod tests;

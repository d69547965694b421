//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//! ```

// Core analysis types
pub use crate::error::{DeadcssError, DeadcssResult};
pub use crate::selector::{Dialect, SourcePosition};

// Detection
pub use crate::detect::{
    analyze, detect_unused, DetectionContext, DetectionReport, ProjectSnapshot, StylesheetDocument,
};
pub use crate::diagnostics::{unused_rules, UnusedRule};

// Project layout
pub use crate::project::{find_project_root, resolve_project_root};

// Configuration
pub use crate::config::{load_detect_options, DetectOptions};

// Builder API
pub use crate::builder::{AnalysisResult, Deadcss};

// Fix functionality
#[cfg(feature = "fix")]
pub use crate::fix::{removal_edit, remove_rules, FixResult, TextEdit};

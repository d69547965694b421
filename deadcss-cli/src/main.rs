//! deadcss CLI - unused CSS class detector.
//!
//! Features:
//! - Project root detection from a directory or a single stylesheet
//! - Proximity-based consumer search with optional fallback
//! - Rayon-powered parallel analysis (one pass per stylesheet)
//! - Plain text or JSON reports
//! - Rule removal with dry-run

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use std::fs;
use std::path::{Path, PathBuf};

use deadcss_core::{
    find_project_root, init_structured_logging, log_event, log_info, log_warn, print_json,
    print_plain, to_json, Deadcss, Dialect,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find CSS classes no markup or script uses")]
pub struct Cli {
    /// Project root, or a single stylesheet inside a project
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Write the JSON report to a file (relative path)
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Only check this stylesheet (relative to the project root); repeatable
    #[arg(long, action = ArgAction::Append, value_name = "FILE")]
    stylesheet: Vec<String>,

    /// Only look for consumers next to each stylesheet
    #[arg(long)]
    no_fallback: bool,

    /// Remove rules that use an unused class
    #[arg(long)]
    fix: bool,

    /// Show what would be removed without modifying anything
    #[arg(long)]
    fix_dry_run: bool,

    /// Emit structured JSON logs on stderr (filter with RUST_LOG)
    #[arg(long)]
    log: bool,
}

/// Security: Validates output file paths to prevent path traversal attacks.
///
/// Rejects:
/// - Absolute paths (must be relative to current directory)
/// - Paths containing `..` (parent directory traversal)
/// - Paths with null bytes (injection attacks)
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Err(anyhow!(
            "Output path must be relative, not absolute: {}",
            path
        ));
    }

    if p
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(anyhow!(
            "Path traversal (..) not allowed in output paths: {}",
            path
        ));
    }

    // Windows separators are not components on unix
    let normalized = path.replace('\\', "/");
    if normalized.contains("/../") || normalized.starts_with("../") || normalized.ends_with("/..") {
        return Err(anyhow!("Path traversal attempt detected: {}", path));
    }

    Ok(p)
}

/// Resolve the CLI path into a project root and an optional single stylesheet.
fn resolve_target(input: &Path) -> Result<(PathBuf, Option<PathBuf>)> {
    let canonical = input
        .canonicalize()
        .with_context(|| format!("Path not found: {}", input.display()))?;

    if canonical.is_file() {
        if Dialect::from_path(&canonical).is_none() {
            return Err(anyhow!("Not a stylesheet: {}", input.display()));
        }
        let root = find_project_root(&canonical)
            .or_else(|| canonical.parent().map(Path::to_path_buf))
            .with_context(|| format!("No project root for: {}", input.display()))?;
        return Ok((root, Some(canonical)));
    }

    Ok((canonical, None))
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadcss internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    let cli = Cli::parse();

    if cli.log {
        init_structured_logging();
    }

    // Validate the output path before doing any work
    let output = match cli.output.as_deref().map(validate_output_path).transpose() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("[ERROR] Invalid output path: {}", e);
            std::process::exit(2);
        }
    };

    let (root, single) = resolve_target(Path::new(&cli.path))?;

    let mut builder = Deadcss::new(&root)
        .stylesheets(single)
        .stylesheets(cli.stylesheet.iter().map(PathBuf::from))
        .dry_run(cli.fix_dry_run);
    if cli.no_fallback {
        builder = builder.with_fallback(false);
    }

    let result = builder
        .analyze()
        .with_context(|| format!("Failed to analyze {}", root.display()))?;
    log_info(&format!(
        "checked {} stylesheet(s), {} unused class(es)",
        result.stylesheets_checked,
        result.unused_count()
    ));

    if cli.json {
        print_json(&result);
    } else {
        print_plain(&result);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&to_json(&result))
            .context("Failed to serialize report")?;
        if let Err(e) = fs::write(&path, json) {
            log_warn(&format!("report write failed: {}", e));
            eprintln!("[WARN] Report write failed to {}: {}", path.display(), e);
        } else {
            eprintln!("Report saved to: {}", path.display());
        }
    }

    if cli.fix || cli.fix_dry_run {
        let fixed = builder.fix(&result);
        for error in &fixed.errors {
            eprintln!("[WARN] {}", error);
        }
        log_event(
            "fix",
            &format!(
                "{} rule(s) removed across {} file(s)",
                fixed.rules_removed.len(),
                fixed.files_changed.len()
            ),
        );
    }

    // Exit code (CI-friendly)
    std::process::exit(if result.has_unused() { 1 } else { 0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("deadcss_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    // --- validate_output_path TESTS ---

    #[test]
    fn test_validate_output_path_accepts_relative() {
        assert_eq!(
            validate_output_path("reports/unused.json").unwrap(),
            PathBuf::from("reports/unused.json")
        );
    }

    #[test]
    fn test_validate_output_path_rejects_absolute() {
        assert!(validate_output_path("/tmp/out.json").is_err());
    }

    #[test]
    fn test_validate_output_path_rejects_traversal() {
        assert!(validate_output_path("../out.json").is_err());
        assert!(validate_output_path("a/../../out.json").is_err());
        assert!(validate_output_path("a\\..\\out.json").is_err());
    }

    #[test]
    fn test_validate_output_path_rejects_null_bytes() {
        assert!(validate_output_path("out\0.json").is_err());
    }

    // --- resolve_target TESTS ---

    #[test]
    fn test_resolve_target_directory() {
        let dir = create_temp_dir("dir_target");
        let (root, single) = resolve_target(&dir).unwrap();
        assert_eq!(root, dir.canonicalize().unwrap());
        assert!(single.is_none());
    }

    #[test]
    fn test_resolve_target_stylesheet_finds_project() {
        let dir = create_temp_dir("file_target");
        fs::write(dir.join("package.json"), "{}").unwrap();
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/site.css"), ".a {}").unwrap();

        let (root, single) = resolve_target(&dir.join("src/site.css")).unwrap();
        assert_eq!(root, dir.canonicalize().unwrap());
        assert_eq!(single, Some(dir.join("src/site.css").canonicalize().unwrap()));
    }

    #[test]
    fn test_resolve_target_rejects_non_stylesheet() {
        let dir = create_temp_dir("not_css");
        fs::write(dir.join("index.html"), "").unwrap();
        assert!(resolve_target(&dir.join("index.html")).is_err());
    }

    #[test]
    fn test_resolve_target_missing_path() {
        let dir = create_temp_dir("missing");
        assert!(resolve_target(&dir.join("nope")).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "deadcss",
            "site",
            "--json",
            "--no-fallback",
            "--stylesheet",
            "a.css",
            "--stylesheet",
            "b.scss",
            "--fix-dry-run",
        ]);
        assert_eq!(cli.path, "site");
        assert!(cli.json && cli.no_fallback && cli.fix_dry_run);
        assert!(!cli.fix);
        assert_eq!(cli.stylesheet, vec!["a.css", "b.scss"]);
    }

    #[test]
    fn test_stylesheet_flag_leaves_path_positional() {
        let cli = Cli::parse_from(["deadcss", "--stylesheet", "a.css", "site"]);
        assert_eq!(cli.stylesheet, vec!["a.css"]);
        assert_eq!(cli.path, "site");
    }
}

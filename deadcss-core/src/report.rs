//! Output formatting - plaintext and JSON.

use std::path::Path;

use serde_json::{json, Value};

use crate::builder::AnalysisResult;
use crate::diagnostics::DIAGNOSTIC_MESSAGE;

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Prints unused classes in plain text format, one rule per line.
pub fn print_plain(result: &AnalysisResult) {
    if !result.has_unused() {
        println!(
            "No unused CSS classes found ({} stylesheet(s) checked).",
            result.stylesheets_checked
        );
        return;
    }

    println!("UNUSED CSS CLASSES ({}):", result.unused_count());
    for finding in result.findings.iter().filter(|f| !f.unused.is_empty()) {
        let path = display_path(&result.root, &finding.stylesheet);
        for rule in &finding.rules {
            println!(
                "- {}:{}:{} {} ({}: {})",
                path,
                rule.start.line,
                rule.start.column,
                rule.selector,
                DIAGNOSTIC_MESSAGE,
                rule.class_list()
            );
        }
    }
}

/// JSON document for a result, with root-relative paths.
pub fn to_json(result: &AnalysisResult) -> Value {
    let stylesheets: Vec<Value> = result
        .findings
        .iter()
        .filter(|f| !f.unused.is_empty())
        .map(|f| {
            json!({
                "stylesheet": display_path(&result.root, &f.stylesheet),
                "unused": f.unused,
                "rules": f.rules,
            })
        })
        .collect();

    json!({
        "root": result.root.display().to_string(),
        "checked": result.stylesheets_checked,
        "skipped": result.stylesheets_skipped,
        "unused_count": result.unused_count(),
        "stylesheets": stylesheets,
    })
}

/// Prints unused classes in JSON format.
///
/// Falls back to a bare count if serialization fails.
pub fn print_json(result: &AnalysisResult) {
    match serde_json::to_string_pretty(&to_json(result)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"unused_count\": {}}}", result.unused_count());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StylesheetFindings;
    use crate::diagnostics::unused_rules;
    use crate::selector::Dialect;
    use std::path::PathBuf;

    fn sample() -> AnalysisResult {
        let css = ".used {}\n.gone:hover {}\n";
        let unused = vec!["gone".to_string()];
        AnalysisResult {
            root: PathBuf::from("/site"),
            stylesheets_checked: 2,
            stylesheets_skipped: 0,
            candidate_files: 3,
            findings: vec![
                StylesheetFindings {
                    stylesheet: PathBuf::from("/site/css/a.css"),
                    rules: unused_rules(css, Dialect::Css, &unused),
                    unused,
                    files_read: 1,
                },
                StylesheetFindings {
                    stylesheet: PathBuf::from("/site/css/b.css"),
                    unused: vec![],
                    rules: vec![],
                    files_read: 1,
                },
            ],
        }
    }

    #[test]
    fn test_json_lists_only_stylesheets_with_unused_classes() {
        let value = to_json(&sample());
        assert_eq!(value["unused_count"], 1);
        assert_eq!(value["checked"], 2);

        let sheets = value["stylesheets"].as_array().unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0]["stylesheet"], "css/a.css");
        assert_eq!(sheets[0]["unused"][0], "gone");
        assert_eq!(sheets[0]["rules"][0]["selector"], ".gone:hover");
        assert_eq!(sheets[0]["rules"][0]["start"]["line"], 2);
    }

    #[test]
    fn test_display_path_outside_root() {
        assert_eq!(display_path(Path::new("/site"), Path::new("/other/x.css")), "/other/x.css");
    }
}

//! Comprehensive test suite for deadcss-core.

use crate::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project(files: &[(&str, &str)]) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("deadcss_tests")
        .join(format!("{}_{}", std::process::id(), id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        write_file(&dir.join(file), content);
    }
    dir
}

fn run(root: &Path, stylesheet: &str, options: DetectOptions) -> Option<DetectionReport> {
    let snapshot = ProjectSnapshot::load(root, options).unwrap();
    let path = root.join(stylesheet);
    let text = fs::read_to_string(&path).unwrap();
    analyze(&StylesheetDocument::new(path, text), &snapshot.context())
}

fn unused_of(root: &Path, stylesheet: &str) -> Option<Vec<String>> {
    run(root, stylesheet, DetectOptions::default()).map(|r| r.unused)
}

// Core Test 1: Declarations come out in textual order, duplicates kept
#[test]
fn test_extraction_order() {
    let css = ".a{}\n.a.b{}\n:not(.c) .d{}\n";
    let names: Vec<String> = extract(css).into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["a", "a", "b", "c", "d"]);
    assert_eq!(declared_names(&extract(css)), vec!["a", "b", "c", "d"]);
}

// Core Test 2: A class is only used as a whole token
#[test]
fn test_whole_word_usage() {
    let root = setup_temp_project(&[
        ("src/card.css", ".abc {}\n"),
        ("src/card.html", "<div class=\"nav-abc\"></div>"),
    ]);
    assert_eq!(unused_of(&root, "src/card.css"), Some(vec!["abc".to_string()]));

    write_file(&root.join("src/card.html"), "<div class=\"nav abc\"></div>");
    assert_eq!(unused_of(&root, "src/card.css"), Some(vec![]));
}

// Core Test 3: unused = declared − used, in declaration order
#[test]
fn test_difference_law() {
    let root = setup_temp_project(&[
        ("site.css", ".z {}\n.y {}\n.x {}\n.w {}\n"),
        ("index.jsx", "const a = <div className=\"y w\" />;\n"),
    ]);
    let report = run(&root, "site.css", DetectOptions::default()).unwrap();

    let used: HashSet<String> = report.used.iter().cloned().collect();
    assert_eq!(report.unused, unused_names(&report.declared, &used));
    assert_eq!(report.unused, vec!["z", "x"]);
    assert!(report.unused.iter().all(|n| !report.used.contains(n)));
}

// Core Test 4: Once every class is used, no further file is read
#[test]
fn test_short_circuit_skips_wider_levels() {
    let root = setup_temp_project(&[
        ("a/b/c/s.css", ".one {}\n.two {}\n"),
        ("a/b/near.html", "<p class=\"one two\"></p>"),
        ("a/far.html", "<p class=\"one\"></p>"),
        ("index.html", "<p class=\"two\"></p>"),
    ]);
    let report = run(&root, "a/b/c/s.css", DetectOptions::default()).unwrap();

    assert!(report.unused.is_empty());
    assert_eq!(report.files_read, 1);
}

// Core Test 5: Candidate order does not change the verdict
#[test]
fn test_order_independence() {
    let root = setup_temp_project(&[
        ("site.css", ".a {}\n.b {}\n.c {}\n"),
        ("one.html", "<i class=\"a\"></i>"),
        ("two.vue", "<i class=\"b\"></i>"),
        ("three.php", "<i class=\"zzz\"></i>"),
    ]);
    let snapshot = ProjectSnapshot::load(&root, DetectOptions::default()).unwrap();
    let path = root.join("site.css");
    let doc = StylesheetDocument::new(&path, fs::read_to_string(&path).unwrap());

    let forward = detect_unused(&doc, &snapshot.context()).unwrap();

    let mut reversed = snapshot.clone();
    reversed.candidates.reverse();
    let backward = detect_unused(&doc, &reversed.context()).unwrap();

    assert_eq!(forward, vec!["c"]);
    assert_eq!(forward, backward);
}

// Core Test 6: Nearby files win; root files are never read when nearby exist
#[test]
fn test_proximity_precedence() {
    let root = setup_temp_project(&[
        ("src/comp/comp.css", ".card {}\n.hero {}\n"),
        ("src/comp/comp.tsx", "<div className=\"card\" />"),
        ("index.html", "<div class=\"hero\"></div>"),
    ]);
    let report = run(&root, "src/comp/comp.css", DetectOptions::default()).unwrap();

    assert_eq!(report.unused, vec!["hero"]);
    assert_eq!(report.files_read, 1);
}

// Core Test 7: Walk-up levels are read before the root, which is only read
// while some class is still unresolved
#[test]
fn test_walk_up_before_root() {
    let root = setup_temp_project(&[
        ("src/widgets/card/card.css", ".x {}\n.y {}\n"),
        ("src/widgets/list.html", "<li class=\"x y\"></li>"),
        ("index.html", "<div class=\"z\"></div>"),
    ]);
    let report = run(&root, "src/widgets/card/card.css", DetectOptions::default()).unwrap();
    assert!(report.unused.is_empty());
    assert_eq!(report.files_read, 1);
}

// Core Test 7b: An unrelated file on a walk-up level does not hide root usage
#[test]
fn test_root_consulted_after_populated_walk_up() {
    let root = setup_temp_project(&[
        ("src/ui/x.css", ".hero {}\n.ghost {}\n"),
        ("src/main.ts", "import './ui/x.css';\n"),
        ("index.html", "<div class=\"hero\"></div>"),
    ]);
    let report = run(&root, "src/ui/x.css", DetectOptions::default()).unwrap();
    assert!(report.used.contains("hero"));
    assert_eq!(report.unused, vec!["ghost"]);
    assert_eq!(report.files_read, 2);
}

// Core Test 8: Root fallback only when nothing closer exists
#[test]
fn test_root_fallback() {
    let root = setup_temp_project(&[
        ("styles/deep/site.css", ".y {}\n"),
        ("index.html", "<div class=\"y\"></div>"),
    ]);
    assert_eq!(unused_of(&root, "styles/deep/site.css"), Some(vec![]));
}

// Core Test 9: Disabled fallback never leaves the stylesheet's directory
#[test]
fn test_fallback_disabled() {
    let root = setup_temp_project(&[
        ("styles/deep/site.css", ".y {}\n"),
        ("styles/page.html", "<div class=\"y\"></div>"),
        ("index.html", "<div class=\"y\"></div>"),
    ]);
    let report = run(
        &root,
        "styles/deep/site.css",
        DetectOptions::default().with_fallback(false),
    )
    .unwrap();

    assert_eq!(report.unused, vec!["y"]);
    assert_eq!(report.files_read, 0);
}

// Core Test 10: Ignored consumer files are never read
#[test]
fn test_ignore_respect() {
    let root = setup_temp_project(&[
        (".gitignore", "generated/\n*.min.js\n"),
        ("src/app.css", ".a {}\n.b {}\n"),
        ("src/generated/page.html", "<p class=\"a\"></p>"),
        ("src/bundle.min.js", "el.className = \"b\";"),
    ]);
    let report = run(&root, "src/app.css", DetectOptions::default()).unwrap();

    assert_eq!(report.unused, vec!["a", "b"]);
    assert_eq!(report.files_read, 0);
}

// Core Test 11: An ignored stylesheet is skipped, not reported as clean
#[test]
fn test_skip_precedence_for_ignored_stylesheet() {
    let root = setup_temp_project(&[
        (".gitignore", "vendor.css\n"),
        ("css/vendor.css", ".unused {}\n"),
    ]);
    assert_eq!(unused_of(&root, "css/vendor.css"), None);
}

// Core Test 12: Excluded directories never contribute candidates
#[test]
fn test_node_modules_excluded() {
    let root = setup_temp_project(&[
        ("site.css", ".pkg {}\n"),
        ("node_modules/pkg/index.html", "<p class=\"pkg\"></p>"),
    ]);
    assert_eq!(unused_of(&root, "site.css"), Some(vec!["pkg".to_string()]));
}

// Core Test 13: Applying the quick fix removes exactly the flagged rule
#[cfg(feature = "fix")]
#[test]
fn test_fix_removes_exactly_one_rule() {
    let root = setup_temp_project(&[
        ("site.css", ".keep { a: b; }\n.drop {\n  c: d;\n}\n.also { e: f; }\n"),
        ("index.html", "<p class=\"keep also\"></p>"),
    ]);
    let report = run(&root, "site.css", DetectOptions::default()).unwrap();
    let text = fs::read_to_string(root.join("site.css")).unwrap();
    let rules = unused_rules(&text, report.dialect, &report.unused);
    assert_eq!(rules.len(), 1);

    let fixed = apply_edit(&text, &removal_edit(&text, &rules[0])).unwrap();
    assert_eq!(fixed, ".keep { a: b; }\n\n.also { e: f; }\n");
    assert_eq!(declared_names(&extract(&fixed)), vec!["keep", "also"]);
}

// Core Test 14: Nested SCSS rules are extracted and checked
#[test]
fn test_scss_nesting_project() {
    let root = setup_temp_project(&[
        (
            "ui/menu.scss",
            "$gap: 4px;\n.menu {\n  // .commented {}\n  .item { margin: $gap; }\n  &:hover { color: red; }\n}\n",
        ),
        ("ui/menu.svelte", "<ul class=\"menu\"><li class=\"item\"></li></ul>"),
    ]);
    assert_eq!(unused_of(&root, "ui/menu.scss"), Some(vec![]));
}

// Core Test 15: Indented Sass stylesheets
#[test]
fn test_sass_project() {
    let root = setup_temp_project(&[
        ("ui/theme.sass", ".panel\n  padding: 0\n  .title\n    margin: 0\n.unused\n  color: red\n"),
        ("ui/theme.html", "<div class=\"panel\"><h1 class=\"title\"></h1></div>"),
    ]);
    let report = run(&root, "ui/theme.sass", DetectOptions::default()).unwrap();
    assert_eq!(report.dialect, Dialect::Sass);
    assert_eq!(report.unused, vec!["unused"]);
}

// Core Test 16: deadcss.toml settings reach the whole-project run
#[test]
fn test_config_file_disables_fallback() {
    let root = setup_temp_project(&[
        (CONFIG_FILE, "enable_fallback_search = false\n"),
        ("styles/site.css", ".y {}\n"),
        ("index.html", "<div class=\"y\"></div>"),
    ]);
    let result = Deadcss::new(&root).analyze().unwrap();
    assert_eq!(result.unused_count(), 1);

    let result = Deadcss::new(&root).with_fallback(true).analyze().unwrap();
    assert_eq!(result.unused_count(), 0);
}

// Core Test 17: Root resolution picks the innermost workspace folder
#[test]
fn test_nested_workspace_folders() {
    let root = setup_temp_project(&[
        ("site/a.css", ".a {}\n"),
        ("site/index.html", "<p class=\"a\"></p>"),
    ]);
    let folders = vec![root.clone(), root.join("site")];
    let stylesheet = root.join("site/a.css");
    assert_eq!(
        resolve_project_root(&stylesheet, &folders),
        Some(root.join("site"))
    );
}

// Edge Case: a stylesheet without classes is an empty result, not a skip
#[test]
fn test_stylesheet_without_classes() {
    let root = setup_temp_project(&[
        ("base.css", "body { margin: 0; }\n#id { color: red; }\n"),
        ("index.html", ""),
    ]);
    let report = run(&root, "base.css", DetectOptions::default()).unwrap();
    assert!(report.declared.is_empty());
    assert!(report.unused.is_empty());
    assert_eq!(report.files_read, 0);
}

// Edge Case: usage on a different line than `class` does not count
#[test]
fn test_usage_must_share_a_line() {
    let root = setup_temp_project(&[
        ("site.css", ".btn {}\n"),
        ("index.html", "<a class=\"x\"\n   title=\"btn\"></a>"),
    ]);
    assert_eq!(unused_of(&root, "site.css"), Some(vec!["btn".to_string()]));
}

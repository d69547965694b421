//! Configuration loading from deadcss.toml.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{DeadcssError, DeadcssResult, IoResultExt};

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "deadcss.toml";

/// Consumer file extensions scanned for class usage by default.
pub const DEFAULT_CONSUMER_EXTENSIONS: &[&str] = &[
    "html", "htm", "jsx", "tsx", "js", "ts", "php", "vue", "svelte", "astro", "erb", "hbs",
    "ejs", "twig", "cshtml", "razor", "jsp",
];

/// Dependency and build directories never walked for candidates.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    "vendor",
    "bower_components",
    ".next",
    ".cache",
];

/// Main configuration structure for deadcss.toml.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DeadcssConfig {
    /// Walk up the tree (and finally the project root) when no consumer
    /// file sits next to the stylesheet. Defaults to true.
    pub enable_fallback_search: Option<bool>,
    /// Replaces the default consumer extension list.
    pub consumer_extensions: Option<Vec<String>>,
    /// Extra directory names to prune, on top of the defaults.
    pub exclude_dirs: Option<Vec<String>>,
}

/// Options threaded through a detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectOptions {
    pub enable_fallback_search: bool,
    pub consumer_extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            enable_fallback_search: true,
            consumer_extensions: DEFAULT_CONSUMER_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DetectOptions {
    /// Enable or disable the walk-up/root fallback search.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.enable_fallback_search = enabled;
        self
    }

    /// Whether `ext` (without the dot, any case) names a consumer file.
    pub fn is_consumer_extension(&self, ext: &str) -> bool {
        self.consumer_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl DeadcssConfig {
    /// Resolve the file values against the defaults.
    pub fn detect_options(&self) -> DetectOptions {
        let mut options = DetectOptions::default();

        if let Some(enabled) = self.enable_fallback_search {
            options.enable_fallback_search = enabled;
        }
        if let Some(exts) = &self.consumer_extensions {
            options.consumer_extensions = exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(dirs) = &self.exclude_dirs {
            for dir in dirs {
                if !options.excluded_dirs.contains(dir) {
                    options.excluded_dirs.push(dir.clone());
                }
            }
        }

        options
    }
}

/// Loads configuration from deadcss.toml if it exists.
pub fn load_config(root: &Path) -> DeadcssResult<Option<DeadcssConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg = toml::from_str(&content).map_err(|e| DeadcssError::config(&path, e.message()))?;
    Ok(Some(cfg))
}

/// Loads deadcss.toml and resolves it, falling back to defaults on any error.
pub fn load_detect_options(root: &Path) -> DetectOptions {
    match load_config(root) {
        Ok(Some(cfg)) => cfg.detect_options(),
        Ok(None) => DetectOptions::default(),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring deadcss.toml");
            DetectOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("deadcss_config_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = create_temp_dir("missing");
        assert!(load_config(&dir).unwrap().is_none());
        assert_eq!(load_detect_options(&dir), DetectOptions::default());
    }

    #[test]
    fn test_defaults_enable_fallback() {
        let options = DetectOptions::default();
        assert!(options.enable_fallback_search);
        assert!(options.is_consumer_extension("tsx"));
        assert!(options.is_consumer_extension("HTML"));
        assert!(!options.is_consumer_extension("css"));
        assert!(options.excluded_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_load_config_overrides() {
        let dir = create_temp_dir("overrides");
        fs::write(
            dir.join(CONFIG_FILE),
            "enable_fallback_search = false\nconsumer_extensions = [\".html\", \"jsx\"]\nexclude_dirs = [\"generated\"]\n",
        )
        .unwrap();

        let options = load_config(&dir).unwrap().unwrap().detect_options();
        assert!(!options.enable_fallback_search);
        assert_eq!(options.consumer_extensions, vec!["html", "jsx"]);
        assert!(options.excluded_dirs.iter().any(|d| d == "generated"));
        assert!(options.excluded_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = create_temp_dir("invalid");
        fs::write(dir.join(CONFIG_FILE), "enable_fallback_search = \"yes\"").unwrap();

        let err = load_config(&dir).unwrap_err();
        assert!(matches!(err, DeadcssError::Config { ref path, .. } if path == &dir.join(CONFIG_FILE)));
        assert_eq!(load_detect_options(&dir), DetectOptions::default());
    }
}

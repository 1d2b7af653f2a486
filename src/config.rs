//! Configuration loading from callmap.toml.
//!
//! The file is looked up in the analysis root first, then in each ancestor
//! directory; the nearest one wins.
//!
//! ## Example
//!
//! ```toml
//! include = ["internal/**", "pkg/**"]
//! extend-exclude = ["**/mocks/**"]
//! include-tests = false
//! include-generated = false
//! ```
//!
//! Patterns are matched against root-relative paths.

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "callmap.toml";

/// Default exclude patterns (vendored code, fixtures, tool directories).
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/vendor/**",
    "**/testdata/**",
    "**/.git/**",
    "**/node_modules/**",
    "**/third_party/**",
    "**/_obj/**",
];

/// Callmap configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Glob patterns for files to include. If empty, include all Go files.
    pub include: Vec<String>,

    /// Glob patterns for files to exclude. Replaces defaults if set.
    pub exclude: Vec<String>,

    /// Additional exclude patterns (extends defaults).
    pub extend_exclude: Vec<String>,

    /// Analyze `_test.go` files.
    pub include_tests: bool,

    /// Analyze files marked `// Code generated ... DO NOT EDIT.`
    pub include_generated: bool,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extend_exclude: Option<Vec<String>>,
    include_tests: Option<bool>,
    include_generated: Option<bool>,
}

impl Config {
    /// Load configuration for an analysis rooted at `directory`.
    ///
    /// A file that cannot be read or parsed is skipped with a warning and the
    /// search continues upwards; with nothing found, defaults apply.
    pub fn load(directory: &Path) -> Self {
        for dir in directory.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if !candidate.is_file() {
                continue;
            }
            match Self::load_file(&candidate) {
                Ok(config) => return config,
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), "ignoring config: {err:#}");
                }
            }
        }

        Self::default()
    }

    /// Parse one config file.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&content)?;
        Ok(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        Self {
            source: Some(source),
            include: raw.include.unwrap_or_default(),
            exclude: raw.exclude.unwrap_or_default(),
            extend_exclude: raw.extend_exclude.unwrap_or_default(),
            include_tests: raw.include_tests.unwrap_or(false),
            include_generated: raw.include_generated.unwrap_or(false),
        }
    }

    /// Get effective exclude patterns (defaults + extend-exclude, or custom exclude).
    pub fn effective_excludes(&self) -> Vec<String> {
        if !self.exclude.is_empty() {
            // Custom exclude replaces defaults
            self.exclude.clone()
        } else {
            let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
            patterns.extend(self.extend_exclude.iter().cloned());
            patterns
        }
    }

    /// True if there are no include patterns or `rel_path` matches one.
    pub fn matches_include(&self, rel_path: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let path_str = rel_path.to_string_lossy();
        self.include
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    pub fn matches_exclude(&self, rel_path: &Path) -> bool {
        let path_str = rel_path.to_string_lossy();
        self.effective_excludes()
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Matches include AND not exclude.
    pub fn should_include(&self, rel_path: &Path) -> bool {
        self.matches_include(rel_path) && !self.matches_exclude(rel_path)
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.source {
            Some(source) => lines.push(format!("config: {}", source.display())),
            None => lines.push("config: (defaults)".to_string()),
        }

        if !self.include.is_empty() {
            lines.push(format!("include: {}", self.include.join(", ")));
        }

        let excludes = self.effective_excludes();
        if excludes.len() <= 3 {
            lines.push(format!("exclude: {}", excludes.join(", ")));
        } else {
            lines.push(format!(
                "exclude: {}, ... (+{} more)",
                excludes[..2].join(", "),
                excludes.len() - 2
            ));
        }

        lines.push(format!(
            "tests: {}, generated: {}",
            self.include_tests, self.include_generated
        ));

        lines.join("\n")
    }
}

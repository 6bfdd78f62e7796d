//! Configuration types

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// FlowCheck configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Check selection
    pub checks: CheckConfig,

    /// Source file discovery
    pub files: FileConfig,

    /// Preprocessor behaviour
    pub preprocess: PreprocessConfig,
}

impl Config {
    /// Load a YAML configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Check configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Report style findings (dangerous functions)
    pub style: bool,

    /// Report findings that may be false positives
    pub show_all: bool,

    /// Names of checks to skip
    pub disabled: Vec<String>,

    /// GUI classes whose values come straight from the user
    pub input_classes: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            style: false,
            show_all: false,
            disabled: vec![],
            input_classes: vec!["TEdit".into()],
        }
    }
}

impl CheckConfig {
    /// Whether the named check should run
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }
}

/// File discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// File extensions to check
    pub extensions: Vec<String>,

    /// Glob patterns of paths to skip
    pub exclude: Vec<String>,

    /// Descend into subdirectories
    pub recursive: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                "c".into(),
                "cpp".into(),
                "cc".into(),
                "cxx".into(),
                "h".into(),
                "hpp".into(),
            ],
            exclude: vec!["**/.git/**".into()],
            recursive: false,
        }
    }
}

/// Preprocessor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Splice `#include "file"` contents into the including file
    pub expand_includes: bool,

    /// Extra directories searched for quoted includes
    pub include_paths: Vec<PathBuf>,

    /// Maximum nesting of spliced includes
    pub max_include_depth: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            expand_includes: false,
            include_paths: vec![],
            max_include_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.checks.style);
        assert_eq!(config.checks.input_classes, vec!["TEdit".to_string()]);
        assert!(config.files.extensions.contains(&"cpp".to_string()));
        assert_eq!(config.preprocess.max_include_depth, 16);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
checks:
  style: true
  disabled: [buffer_overrun]
preprocess:
  expand_includes: true
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.checks.style);
        assert!(!config.checks.is_enabled("buffer_overrun"));
        assert!(config.checks.is_enabled("validate"));
        assert!(config.preprocess.expand_includes);
        assert_eq!(config.preprocess.max_include_depth, 16);
        assert_eq!(config.files, FileConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("flowcheck.yaml");
        std::fs::write(&path, "files:\n  recursive: true\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.files.recursive);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("checks: [1, 2").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}

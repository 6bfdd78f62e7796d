//! C Preprocessor
//!
//! Resolves conditional compilation into one source text per configuration.
//! The passes are plain functions; [`Preprocessor`] chains them:
//!
//! 1. [`read`] normalizes the raw stream (comments, continuations, `\r`)
//! 2. [`handle_includes`] splices quoted headers, when enabled
//! 3. [`remove_space_near_nl`] and [`replace_if_defined`] canonicalize
//!    directive lines
//! 4. [`get_cfgs`] lists the configurations
//! 5. [`get_code`] and [`expand_macros`] produce each configuration's code
//!
//! Every pass keeps one output line per input line, so token line numbers
//! refer to the original file.

pub mod conditions;
pub mod headers;
pub mod macros;
pub mod normalize;

pub use conditions::{get_cfgs, get_code, get_def, match_cfg_def};
pub use headers::{get_header_file_name, handle_includes, HeaderResolver};
pub use macros::{expand_macros, MacroDefinition};
pub use normalize::{read, remove_space_near_nl, replace_if_defined};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use flowcheck_core::config::PreprocessConfig;

/// Errors that can occur during preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<PreprocessError> for flowcheck_core::Error {
    fn from(e: PreprocessError) -> Self {
        match e {
            PreprocessError::IoError(io) => flowcheck_core::Error::Io(io),
        }
    }
}

/// Split a directive line into its keyword and the trimmed remainder.
///
/// `"  # ifdef  X "` gives `("ifdef", "X")`. `None` for lines that do not
/// start with `#`.
pub(crate) fn split_directive(line: &str) -> Option<(&str, &str)> {
    let body = line.trim_start().strip_prefix('#')?.trim_start();
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    Some((&body[..end], body[end..].trim()))
}

/// Options for preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Splice quoted `#include` files
    pub expand_includes: bool,
    /// Include search paths (-I flags)
    pub include_paths: Vec<PathBuf>,
    /// Deepest include nesting that is still expanded
    pub max_include_depth: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            expand_includes: false,
            include_paths: Vec::new(),
            max_include_depth: 16,
        }
    }
}

impl From<&PreprocessConfig> for PreprocessOptions {
    fn from(config: &PreprocessConfig) -> Self {
        Self {
            expand_includes: config.expand_includes,
            include_paths: config.include_paths.clone(),
            max_include_depth: config.max_include_depth,
        }
    }
}

/// A normalized file whose configurations are materialized on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedFile {
    /// Normalized text, directives still in place
    pub code: String,
    /// Discovered configurations in source order, without the default `""`
    pub configurations: Vec<String>,
}

impl PreprocessedFile {
    /// Source text for one configuration
    pub fn code_for(&self, cfg: &str) -> String {
        expand_macros(&get_code(&self.code, cfg))
    }

    /// The default configuration followed by the discovered ones
    pub fn all_configurations(&self) -> impl Iterator<Item = &str> {
        std::iter::once("").chain(self.configurations.iter().map(String::as_str))
    }
}

/// Preprocessor pipeline
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
    resolver: HeaderResolver,
}

impl Preprocessor {
    /// Create a preprocessor with the given options
    pub fn new(options: PreprocessOptions) -> Self {
        let resolver = HeaderResolver::new(options.include_paths.clone());
        Self { options, resolver }
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Normalize `input` and list its configurations without producing
    /// any configuration's code.
    ///
    /// `source` is the path `input` was read from; quoted includes are
    /// resolved relative to it.
    pub fn preprocess_deferred<R: Read>(
        &self,
        input: R,
        source: Option<&Path>,
    ) -> Result<PreprocessedFile, PreprocessError> {
        let mut code = read(input)?;
        if self.options.expand_includes {
            code = handle_includes(&code, source, &self.resolver, self.options.max_include_depth);
        }
        let code = replace_if_defined(&remove_space_near_nl(&code));
        let configurations = get_cfgs(&code);

        debug!(
            "Preprocessed {:?}: {} configurations",
            source,
            configurations.len()
        );
        Ok(PreprocessedFile {
            code,
            configurations,
        })
    }

    /// Code of every configuration, keyed by configuration. The default
    /// configuration is stored under `""`.
    pub fn preprocess<R: Read>(
        &self,
        input: R,
        source: Option<&Path>,
    ) -> Result<BTreeMap<String, String>, PreprocessError> {
        let file = self.preprocess_deferred(input, source)?;
        Ok(file
            .all_configurations()
            .map(|cfg| (cfg.to_string(), file.code_for(cfg)))
            .collect())
    }

    /// Open and preprocess a file lazily
    pub fn preprocess_file(&self, path: &Path) -> Result<PreprocessedFile, PreprocessError> {
        let file = File::open(path)?;
        self.preprocess_deferred(file, Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const WIN32: &str = "#ifdef WIN32\nint a;\n#else\nint b;\n#endif\n";

    #[test]
    fn test_split_directive() {
        assert_eq!(split_directive("#ifdef X"), Some(("ifdef", "X")));
        assert_eq!(split_directive("  # ifdef  X "), Some(("ifdef", "X")));
        assert_eq!(split_directive("#endif"), Some(("endif", "")));
        assert_eq!(split_directive("#include\"a.h\""), Some(("include", "\"a.h\"")));
        assert_eq!(split_directive("#"), Some(("", "")));
        assert_eq!(split_directive("int a; # x"), None);
    }

    #[test]
    fn test_preprocess_map() {
        let map = Preprocessor::default().preprocess(WIN32.as_bytes(), None).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["", "WIN32"]);
        assert_eq!(map[""].trim(), "int b;");
        assert_eq!(map["WIN32"].trim(), "int a;");
    }

    #[test]
    fn test_preprocess_normalizes_first() {
        let code = "  #if defined(LINUX)  \r\nint x = N; /* n */\r\n#endif\r\n#define N 2\r\nN;\r\n";
        let file = Preprocessor::default()
            .preprocess_deferred(code.as_bytes(), None)
            .unwrap();
        assert_eq!(file.configurations, ["LINUX"]);
        assert_eq!(file.code_for("LINUX"), "\nint x = N;\n\n\n2;\n");
        assert_eq!(file.code_for(""), "\n\n\n\n2;\n");
    }

    #[test]
    fn test_preprocess_elif_defined() {
        let code = "#ifdef A\nx;\n#elif defined(B)\ny;\n#else\nz;\n#endif\n";
        let map = Preprocessor::default().preprocess(code.as_bytes(), None).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["", "A"]);
        assert_eq!(map[""], "\n\n\n\n\nz;\n\n");
        assert_eq!(map["A"].trim(), "x;");
    }

    #[test]
    fn test_deferred_matches_eager() {
        let code = "#ifndef GUARD\n#define GUARD\n#ifdef A\na;\n#endif\n#endif\n";
        let pre = Preprocessor::default();
        let file = pre.preprocess_deferred(code.as_bytes(), None).unwrap();
        let map = pre.preprocess(code.as_bytes(), None).unwrap();

        assert_eq!(file.all_configurations().collect::<Vec<_>>(), ["", "!GUARD", "A"]);
        for cfg in file.all_configurations() {
            assert_eq!(file.code_for(cfg), map[cfg]);
        }
    }

    #[test]
    fn test_unterminated_block_all_configurations() {
        let code = "#ifdef A\nx;\n#ifndef B\ny;\n";
        let map = Preprocessor::default().preprocess(code.as_bytes(), None).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["A"], "\nx;\n\ny;\n");
        assert_eq!(map["!B"], "\n\n\n\n");
    }

    #[test]
    fn test_preprocess_file_with_includes() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("inc")).unwrap();
        fs::write(temp.path().join("inc/config.h"), "#define SIZE 10\n").unwrap();
        let main = temp.path().join("main.c");
        fs::write(&main, "#include \"config.h\"\nchar buf[SIZE];\n").unwrap();

        let pre = Preprocessor::new(PreprocessOptions {
            expand_includes: true,
            include_paths: vec![temp.path().join("inc")],
            ..Default::default()
        });
        let file = pre.preprocess_file(&main).unwrap();
        let code = file.code_for("");
        assert!(code.starts_with("#file \""));
        assert!(code.contains("\n\n#endfile\nchar buf[10];\n"));

        let file = Preprocessor::default().preprocess_file(&main).unwrap();
        assert_eq!(file.code_for(""), "#include \"config.h\"\nchar buf[SIZE];\n");
    }

    #[test]
    fn test_preprocess_missing_file() {
        let err = Preprocessor::default()
            .preprocess_file(Path::new("/nonexistent/flowcheck.c"))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::IoError(_)));
        assert!(matches!(flowcheck_core::Error::from(err), flowcheck_core::Error::Io(_)));
    }

    #[test]
    fn test_options_from_config() {
        let config = PreprocessConfig::default();
        let options = PreprocessOptions::from(&config);
        assert_eq!(options.max_include_depth, config.max_include_depth);
        assert!(!options.expand_includes);
    }
}

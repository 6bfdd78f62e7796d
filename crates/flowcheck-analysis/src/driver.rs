//! Per-file driver
//!
//! Preprocesses a file, tokenizes each configuration and runs the enabled
//! checks. Files are checked in parallel using rayon.

use crate::logger::DiagnosticCollector;
use crate::CheckRegistry;
use flowcheck_core::{Config, Diagnostic, Error, Result};
use flowcheck_parser::{PreprocessOptions, PreprocessedFile, Preprocessor, Tokenizer};
use rayon::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress event emitted after each checked file
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub file: PathBuf,
}

/// Outcome for one file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<Vec<Diagnostic>>,
}

/// Runs the checks of a registry with one configuration
pub struct Checker {
    config: Config,
    registry: CheckRegistry,
    preprocessor: Preprocessor,
    progress_callback: Option<Arc<ProgressCallback>>,
}

impl Checker {
    /// Create a checker with the built-in checks
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, CheckRegistry::builtin())
    }

    pub fn with_registry(config: Config, registry: CheckRegistry) -> Self {
        let preprocessor = Preprocessor::new(PreprocessOptions::from(&config.preprocess));
        Self {
            config,
            registry,
            preprocessor,
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Check one file over all of its configurations
    pub fn check_file(&self, path: &Path) -> Result<Vec<Diagnostic>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;
        let preprocessed = self.preprocessor.preprocess_deferred(file, Some(path))?;
        Ok(self.check_preprocessed(&preprocessed, &path.to_string_lossy()))
    }

    /// Check source text that did not come from a file on disk
    pub fn check_source(&self, code: &str, file_name: &str) -> Result<Vec<Diagnostic>> {
        let preprocessed = self.preprocessor.preprocess_deferred(code.as_bytes(), None)?;
        Ok(self.check_preprocessed(&preprocessed, file_name))
    }

    /// Default configuration first, then the discovered ones. A finding
    /// reported in several configurations is kept once.
    fn check_preprocessed(&self, file: &PreprocessedFile, file_name: &str) -> Vec<Diagnostic> {
        let tokenizer = Tokenizer::new(file_name);
        let mut collector = DiagnosticCollector::new();

        for cfg in file.all_configurations() {
            debug!("Checking {} [{}]", file_name, cfg);
            let stream = tokenizer.tokenize(&file.code_for(cfg));
            self.registry.run(&stream, &self.config.checks, &mut collector);
        }
        collector.into_diagnostics()
    }

    /// Check files in parallel. Results keep the order of `paths`; a file
    /// that cannot be read does not stop the others.
    pub fn check_files(&self, paths: &[PathBuf]) -> Vec<FileReport> {
        let total = paths.len();
        let processed = AtomicUsize::new(0);
        info!("Checking {} files", total);

        paths
            .par_iter()
            .map(|path| {
                let result = self.check_file(path);
                if let Err(e) = &result {
                    warn!("Failed to check {:?}: {}", path, e);
                }

                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit_progress(ProgressEvent {
                    current,
                    total,
                    file: path.clone(),
                });

                FileReport {
                    path: path.clone(),
                    result,
                }
            })
            .collect()
    }

    fn emit_progress(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }
}

/// Check one file with the built-in checks
pub fn check_file(path: &Path, config: &Config) -> Result<Vec<Diagnostic>> {
    Checker::new(config.clone()).check_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_configurations_are_merged() {
        let code = "void f()\n{\n    char a[2];\n#ifdef BIG\n    a[5] = 0;\n#endif\n    a[2] = 0;\n}\n";
        let diags = Checker::new(Config::default()).check_source(code, "cfg.c").unwrap();

        let lines: Vec<u32> = diags.iter().filter_map(|d| d.location().map(|l| l.line)).collect();
        assert_eq!(lines, vec![7, 5]);
    }

    #[test]
    fn test_check_files_parallel() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..5 {
            let path = dir.path().join(format!("test{}.c", i));
            std::fs::write(&path, format!("void f{}() {{ char s[{}]; s[{}] = 0; }}\n", i, i + 1, i)).unwrap();
            paths.push(path);
        }
        paths.push(dir.path().join("missing.c"));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let checker = Checker::new(Config::default())
            .with_progress(move |event| sink.lock().unwrap().push(event.current));
        let reports = checker.check_files(&paths);

        assert_eq!(reports.len(), 6);
        for (report, path) in reports.iter().zip(&paths) {
            assert_eq!(&report.path, path);
        }
        assert!(reports[..5].iter().all(|r| matches!(&r.result, Ok(d) if d.is_empty())));
        assert!(matches!(&reports[5].result, Err(Error::FileNotFound(p)) if p.ends_with("missing.c")));

        let mut seen = events.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_disabled_check() {
        let mut config = Config::default();
        config.checks.disabled.push(crate::bufferoverrun::NAME.to_string());
        let diags = Checker::new(config)
            .check_source("char s[1]; void f() { s[1] = 0; }", "off.c")
            .unwrap();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_check_file_function() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gets.c");
        std::fs::write(&path, "void f() { gets(buf); }\n").unwrap();

        let mut config = Config::default();
        assert!(check_file(&path, &config).unwrap().is_empty());

        config.checks.style = true;
        let diags = check_file(&path, &config).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].id, "dangerousFunctiongets");
        assert_eq!(diags[0].location().unwrap().file, path.to_string_lossy());
    }
}

//! Source file discovery

use flowcheck_core::config::FileConfig;
use flowcheck_core::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collects the source files to check from command line paths
#[derive(Debug, Clone)]
pub struct FileLister {
    extensions: Vec<String>,
    exclude: GlobSet,
    recursive: bool,
}

impl FileLister {
    /// Create a lister from file settings. Fails on an invalid exclude glob.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::Config(format!("invalid exclude pattern '{}': {}", pattern, e)))?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|e| Error::Config(format!("invalid exclude patterns: {}", e)))?;

        Ok(Self {
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            exclude,
            recursive: config.recursive,
        })
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Has one of the source extensions (case-insensitive)
    pub fn accept_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.is_match(path)
    }

    /// Files named directly are taken as they are; directories contribute
    /// their source files, descending only when recursive. Paths are
    /// simplified and returned once each, in discovery order.
    pub fn collect<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut add = |path: &Path| {
            if self.is_excluded(path) {
                debug!("Excluded {:?}", path);
                return;
            }
            let simplified = simplify_path(&path.to_string_lossy());
            if seen.iter().any(|name| same_file_name(name, &simplified)) {
                return;
            }
            files.push(PathBuf::from(&simplified));
            seen.push(simplified);
        };

        for path in paths {
            let path = path.as_ref();
            if path.is_file() {
                add(path);
                continue;
            }
            if !path.is_dir() {
                warn!("No such file or directory: {:?}", path);
                continue;
            }

            let max_depth = if self.recursive { usize::MAX } else { 1 };
            let mut entries: Vec<PathBuf> = WalkDir::new(path)
                .max_depth(max_depth)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| self.accept_file(p))
                .collect();
            entries.sort();
            for entry in &entries {
                add(entry);
            }
        }

        debug!("Found {} source files", files.len());
        files
    }
}

/// Normalize separators to `/`, drop `.` components and fold `dir/..`.
///
/// `./src/../main.c` becomes `main.c`. Leading `..` components are kept.
pub fn simplify_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|p| *p != "..") => {
                parts.pop();
            }
            ".." if absolute => {}
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Whether two file names refer to the same file name. Case-insensitive on
/// Windows.
pub fn same_file_name(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/sub")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("main.c"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("src/a.CPP"), "").unwrap();
        fs::write(root.join("src/sub/b.h"), "").unwrap();
        fs::write(root.join("build/gen.c"), "").unwrap();
        temp
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        let root = simplify_path(&root.to_string_lossy());
        files
            .iter()
            .map(|f| f.to_string_lossy().trim_start_matches(&root).to_string())
            .collect()
    }

    #[test]
    fn test_simplify_path() {
        assert_eq!(simplify_path("./src/../main.c"), "main.c");
        assert_eq!(simplify_path("a/./b//c.c"), "a/b/c.c");
        assert_eq!(simplify_path("../x/y/../z.c"), "../x/z.c");
        assert_eq!(simplify_path("/usr/../etc/a.h"), "/etc/a.h");
        assert_eq!(simplify_path("dir\\sub\\..\\f.c"), "dir/f.c");
    }

    #[test]
    fn test_same_file_name() {
        assert!(same_file_name("a.c", "a.c"));
        assert!(!same_file_name("a.c", "b.c"));
    }

    #[test]
    fn test_collect_non_recursive() {
        let temp = create_tree();
        let lister = FileLister::new(&FileConfig::default()).unwrap();
        let files = lister.collect(&[temp.path()]);
        assert_eq!(names(temp.path(), &files), ["/main.c"]);
    }

    #[test]
    fn test_collect_recursive_with_exclude() {
        let temp = create_tree();
        let config = FileConfig {
            exclude: vec!["**/build/**".into()],
            recursive: true,
            ..Default::default()
        };
        let lister = FileLister::new(&config).unwrap();
        let files = lister.collect(&[temp.path()]);
        assert_eq!(names(temp.path(), &files), ["/main.c", "/src/a.CPP", "/src/sub/b.h"]);
    }

    #[test]
    fn test_collect_explicit_files_once() {
        let temp = create_tree();
        let lister = FileLister::new(&FileConfig::default()).unwrap();
        let notes = temp.path().join("notes.txt");
        let main = temp.path().join("main.c");
        let missing = temp.path().join("missing.c");

        let dotted = temp.path().join("./src/../main.c");

        let files = lister.collect(&[notes, main.clone(), missing, main, dotted]);
        assert_eq!(names(temp.path(), &files), ["/notes.txt", "/main.c"]);
    }

    #[test]
    fn test_recursive_override() {
        let temp = create_tree();
        let lister = FileLister::new(&FileConfig::default()).unwrap().recursive(true);
        let files = lister.collect(&[temp.path().join("src")]);
        assert_eq!(names(temp.path(), &files), ["/src/a.CPP", "/src/sub/b.h"]);
    }

    #[test]
    fn test_invalid_exclude() {
        let config = FileConfig {
            exclude: vec!["a[".into()],
            ..Default::default()
        };
        assert!(matches!(FileLister::new(&config), Err(Error::Config(_))));
    }
}

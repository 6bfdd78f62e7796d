//! Header File Resolver
//!
//! Resolves quoted `#include` lines and splices the header text into the
//! including file between `#file "path"` and `#endfile` marker lines.

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::normalize::read;
use super::{split_directive, PreprocessError};

/// Header file resolver for quoted includes
#[derive(Debug, Clone, Default)]
pub struct HeaderResolver {
    /// Include search paths
    include_paths: Vec<PathBuf>,
}

impl HeaderResolver {
    /// Create a resolver searching the given include paths
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        let mut resolver = Self::default();
        for path in include_paths {
            resolver.add_include_path(path);
        }
        resolver
    }

    /// Add an include path
    pub fn add_include_path(&mut self, path: PathBuf) {
        if !self.include_paths.contains(&path) {
            self.include_paths.push(path);
        }
    }

    /// Get all include paths
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Resolve a header file path
    ///
    /// The directory of the including file is searched first, then the
    /// include paths in order.
    pub fn resolve(&self, header: &str, from_file: Option<&Path>) -> Option<PathBuf> {
        if let Some(parent) = from_file.and_then(Path::parent) {
            let relative_path = parent.join(header);
            if relative_path.is_file() {
                debug!("Resolved {} relative to {:?}", header, from_file);
                return Some(relative_path);
            }
        }

        for include_path in &self.include_paths {
            let full_path = include_path.join(header);
            if full_path.is_file() {
                debug!("Resolved {} in {:?}", header, include_path);
                return Some(full_path);
            }
        }

        debug!("Failed to resolve header: {}", header);
        None
    }
}

/// Text between the first pair of double quotes, empty if there is none.
pub fn get_header_file_name(line: &str) -> String {
    let Some(start) = line.find('"') else {
        return String::new();
    };
    let rest = &line[start + 1..];
    match rest.find('"') {
        Some(end) => rest[..end].to_string(),
        None => String::new(),
    }
}

/// Splice quoted includes into `code`.
///
/// `source` is the file `code` was read from and anchors relative lookups.
/// Headers are normalized with [`read`] and expanded recursively. Angle
/// bracket includes, unresolvable or unreadable headers, headers already on
/// the include stack and includes nested deeper than `max_depth` are left as
/// they are.
pub fn handle_includes(
    code: &str,
    source: Option<&Path>,
    resolver: &HeaderResolver,
    max_depth: usize,
) -> String {
    let mut stack: Vec<PathBuf> = source.map(canonical).into_iter().collect();
    let mut out = String::with_capacity(code.len());
    let limits = Limits { resolver, max_depth };
    splice(code, source, &limits, 0, &mut stack, &mut out);
    out
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

struct Limits<'a> {
    resolver: &'a HeaderResolver,
    max_depth: usize,
}

fn splice(
    code: &str,
    source: Option<&Path>,
    limits: &Limits<'_>,
    depth: usize,
    stack: &mut Vec<PathBuf>,
    out: &mut String,
) {
    for line in code.lines() {
        if let Some((path, header)) = include_text(line, source, limits, depth, stack) {
            out.push_str(&format!("#file \"{}\"\n", path.display()));
            stack.push(canonical(&path));
            splice(&header, Some(&path), limits, depth + 1, stack, out);
            stack.pop();
            out.push_str("#endfile");
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
}

/// Resolved path and normalized text of the header named on an include line
fn include_text(
    line: &str,
    source: Option<&Path>,
    limits: &Limits<'_>,
    depth: usize,
    stack: &[PathBuf],
) -> Option<(PathBuf, String)> {
    let (keyword, rest) = split_directive(line)?;
    if keyword != "include" || !rest.starts_with('"') {
        return None;
    }

    let header = get_header_file_name(rest);
    if header.is_empty() {
        return None;
    }
    if depth >= limits.max_depth {
        warn!("Include depth {} reached, not expanding {}", limits.max_depth, header);
        return None;
    }

    let path = limits.resolver.resolve(&header, source)?;
    if stack.contains(&canonical(&path)) {
        debug!("Skipping recursive include of {:?}", path);
        return None;
    }

    let text = match File::open(&path).map_err(PreprocessError::from).and_then(read) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read header {:?}: {}", path, e);
            return None;
        }
    };
    Some((path, text))
}

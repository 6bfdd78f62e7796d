//! Diagnostic sink
//!
//! Checks never print; they hand each finding to an [`ErrorLogger`].

use flowcheck_core::Diagnostic;
use std::collections::HashSet;

/// Receiver of findings
pub trait ErrorLogger {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in report order, dropping exact duplicates
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl ErrorLogger for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        if self.seen.insert(diagnostic.clone()) {
            self.diagnostics.push(diagnostic);
        }
    }
}

impl ErrorLogger for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

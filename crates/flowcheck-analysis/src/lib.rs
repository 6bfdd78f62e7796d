//! FlowCheck Analysis Engine
//!
//! Runs token pattern checks over every configuration of a source file:
//! - Dangerous function calls (mktemp, gets, scanf)
//! - Unvalidated numeric input
//! - Constant buffer overruns
//! - Source file discovery
//! - Parallel per-file driver

pub mod bufferoverrun;
pub mod dangerous;
pub mod driver;
pub mod filelister;
pub mod logger;
pub mod validate;

pub use driver::{check_file, Checker, FileReport, ProgressEvent};
pub use filelister::FileLister;
pub use logger::{DiagnosticCollector, ErrorLogger};

use flowcheck_core::config::CheckConfig;
use flowcheck_parser::TokenStream;
use tracing::debug;

/// Entry point of a check
pub type RunFn = fn(&TokenStream, &CheckConfig, &mut dyn ErrorLogger);

/// Reports one example of every diagnostic a check can produce
pub type ErrorMessagesFn = fn(&mut dyn ErrorLogger);

/// A check that can run over a token stream
pub trait Check: Send + Sync {
    /// Name used to disable the check in settings
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Report findings for one token stream
    fn run(&self, stream: &TokenStream, settings: &CheckConfig, logger: &mut dyn ErrorLogger);

    /// Report an example of every diagnostic, without locations
    fn error_messages(&self, logger: &mut dyn ErrorLogger);
}

/// A check described by plain data
#[derive(Debug, Clone, Copy)]
pub struct CheckDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub run: RunFn,
    pub error_messages: ErrorMessagesFn,
}

impl Check for CheckDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn run(&self, stream: &TokenStream, settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
        (self.run)(stream, settings, logger)
    }

    fn error_messages(&self, logger: &mut dyn ErrorLogger) {
        (self.error_messages)(logger)
    }
}

/// Table of available checks
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Registry holding the built-in checks
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(bufferoverrun::descriptor());
        registry.register(dangerous::descriptor());
        registry.register(validate::descriptor());
        registry
    }

    /// Add a check. A check with the same name is replaced.
    pub fn register(&mut self, check: impl Check + 'static) {
        self.checks.retain(|c| c.name() != check.name());
        self.checks.push(Box::new(check));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Check> {
        self.checks.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks().map(|c| c.name()).collect()
    }

    /// Run every check not disabled in `settings`
    pub fn run(&self, stream: &TokenStream, settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
        for check in self.checks() {
            if !settings.is_enabled(check.name()) {
                debug!("Check {} disabled", check.name());
                continue;
            }
            check.run(stream, settings, logger);
        }
    }

    /// Example diagnostics of every check
    pub fn error_messages(&self, logger: &mut dyn ErrorLogger) {
        for check in self.checks() {
            check.error_messages(logger);
        }
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests;

//! Core type definitions

use crate::location::Location;
use serde::{Deserialize, Serialize};

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Definite bug (out of bounds access, overrun)
    Error,
    /// Input reaches the program without validation
    Security,
    /// Questionable but legal code
    Style,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Security => "security",
            Severity::Style => "style",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding reported by a check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable identifier, e.g. "arrayIndexOutOfBounds"
    pub id: String,
    /// Severity
    pub severity: Severity,
    /// Human readable message
    pub message: String,
    /// Locations, innermost last. Empty for example diagnostics.
    pub locations: Vec<Location>,
}

impl Diagnostic {
    /// Create a diagnostic without a location
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    /// Attach a location
    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Primary location (the last one), if any
    pub fn location(&self) -> Option<&Location> {
        self.locations.last()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, loc) in self.locations.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "[{}]", loc)?;
        }
        if !self.locations.is_empty() {
            f.write_str(": ")?;
        }
        write!(f, "({}) {}", self.severity, self.message)
    }
}

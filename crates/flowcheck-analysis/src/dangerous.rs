//! Dangerous function calls
//!
//! Flags calls to library functions that cannot be used safely.

use flowcheck_core::config::CheckConfig;
use flowcheck_core::{Diagnostic, Location, Severity};
use flowcheck_parser::{find_match, TokenStream};

use crate::logger::ErrorLogger;
use crate::CheckDescriptor;

pub const NAME: &str = "dangerous_functions";

/// (function, replacement)
const DANGEROUS: &[(&str, &str)] = &[("mktemp", "mkstemp"), ("gets", "fgets"), ("scanf", "fgets")];

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor {
        name: NAME,
        description: "Calls to mktemp, gets and scanf",
        run: dangerous_functions,
        error_messages,
    }
}

fn dangerous_function(function: &str, replacement: &str, location: Option<Location>) -> Diagnostic {
    let diag = Diagnostic::new(
        format!("dangerousFunction{function}"),
        Severity::Style,
        format!("Found '{function}'. You should use '{replacement}' instead"),
    );
    match location {
        Some(location) => diag.at(location),
        None => diag,
    }
}

/// Report every call of a dangerous function. Style findings only.
pub fn dangerous_functions(stream: &TokenStream, settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
    if !settings.style {
        return;
    }

    let mut cursor = stream.head();
    while let Some(tok) = find_match(stream, cursor, "mktemp|gets|scanf (", 0) {
        let text = stream[tok].text();
        if let Some((function, replacement)) = DANGEROUS.iter().find(|(f, _)| *f == text) {
            logger.report(dangerous_function(function, replacement, Some(stream.location(tok))));
        }
        cursor = stream.next(tok);
    }
}

fn error_messages(logger: &mut dyn ErrorLogger) {
    for (function, replacement) in DANGEROUS {
        logger.report(dangerous_function(function, replacement, None));
    }
}

//! Unvalidated input
//!
//! Two sources of untrusted values are recognized: numbers read from a
//! stream straight into an `int`, and numbers parsed out of GUI input
//! controls.

use flowcheck_core::config::CheckConfig;
use flowcheck_core::{Diagnostic, Location, Severity};
use flowcheck_parser::{find_match, token_match, Pattern, TokenStream};

use crate::logger::ErrorLogger;
use crate::CheckDescriptor;

pub const NAME: &str = "validate";

/// Functions that convert text without reporting malformed input
const PARSE_FUNCTIONS: &str = "atoi|atof|strtol|strtoul";

/// Reads that store a number into the variable without checks
const UNCHECKED_READS: &[&str] = &[
    "cin >> %varid%",
    "fscanf ( %var% , %str% , %varid%",
    "scanf ( %str% , %varid%",
];

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor {
        name: NAME,
        description: "Numbers read from streams or GUI controls without validation",
        run: validate,
        error_messages,
    }
}

fn unvalidated_input(location: Option<Location>) -> Diagnostic {
    let diag = Diagnostic::new("unvalidatedInput", Severity::Security, "Unvalidated input");
    match location {
        Some(location) => diag.at(location),
        None => diag,
    }
}

pub fn validate(stream: &TokenStream, settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
    readnum(stream, logger);
    if settings.show_all {
        gui(stream, &settings.input_classes, logger);
    }
}

/// `int` variables filled by `cin >>`, `fscanf` or `scanf`
pub fn readnum(stream: &TokenStream, logger: &mut dyn ErrorLogger) {
    let declaration = Pattern::compile("int %var% ;");
    let reads: Vec<Pattern> = UNCHECKED_READS.iter().copied().map(Pattern::compile).collect();
    let mut cursor = stream.head();

    while let Some(decl) = declaration.find(stream, cursor, 0) {
        cursor = stream.tok_at(decl, 2);
        let var_id = stream.tok_at(decl, 1).map_or(0, |name| stream[name].var_id());
        if var_id == 0 {
            continue;
        }

        for tok in stream.iter_from(cursor) {
            if reads.iter().any(|read| read.matches_varid(stream, Some(tok), var_id)) {
                logger.report(unvalidated_input(Some(stream.location(tok))));
            }
        }
    }
}

/// Values of input controls handed to a parse function. `input_classes`
/// names the control classes, e.g. `TEdit`.
pub fn gui(stream: &TokenStream, input_classes: &[String], logger: &mut dyn ErrorLogger) {
    for class in input_classes {
        let declaration = format!("{class} * %var% ;|=");
        for tok in stream.iter() {
            if !token_match(stream, Some(tok), &declaration) {
                continue;
            }
            let name = stream.str_at(tok, 2);
            let parse = format!("{PARSE_FUNCTIONS} ( {name} .");
            if let Some(hit) = find_match(stream, Some(tok), &parse, 0) {
                logger.report(unvalidated_input(Some(stream.location(hit))));
            }
        }
    }
}

fn error_messages(logger: &mut dyn ErrorLogger) {
    logger.report(unvalidated_input(None));
}

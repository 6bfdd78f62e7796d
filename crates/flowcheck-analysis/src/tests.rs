//! Registry tests

use super::*;
use flowcheck_core::{Diagnostic, Severity};
use flowcheck_parser::tokenize;
use pretty_assertions::assert_eq;

fn count_semicolons(stream: &TokenStream, _settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
    let count = stream.iter().filter(|&id| stream[id].text() == ";").count();
    logger.report(Diagnostic::new("semicolons", Severity::Style, format!("{count} semicolons")));
}

fn no_messages(_logger: &mut dyn ErrorLogger) {}

fn semicolon_check() -> CheckDescriptor {
    CheckDescriptor {
        name: "semicolons",
        description: "Counts semicolons",
        run: count_semicolons,
        error_messages: no_messages,
    }
}

#[test]
fn test_builtin_checks() {
    let registry = CheckRegistry::builtin();
    assert_eq!(registry.names(), ["buffer_overrun", "dangerous_functions", "validate"]);
    assert!(registry.get("validate").is_some());
    assert!(registry.get("unknown").is_none());
    assert!(registry.checks().all(|c| !c.description().is_empty()));
}

#[test]
fn test_register_custom_check() {
    let mut registry = CheckRegistry::new();
    registry.register(semicolon_check());
    registry.register(semicolon_check());
    assert_eq!(registry.names(), ["semicolons"]);

    let stream = tokenize("int a; int b;", "test.c");
    let mut collector = DiagnosticCollector::new();
    registry.run(&stream, &CheckConfig::default(), &mut collector);
    assert_eq!(collector.diagnostics()[0].message, "2 semicolons");
}

#[test]
fn test_run_respects_disabled() {
    let mut registry = CheckRegistry::builtin();
    registry.register(semicolon_check());

    let settings = CheckConfig {
        disabled: vec!["semicolons".into(), "buffer_overrun".into()],
        ..Default::default()
    };
    let stream = tokenize("char s[1]; void f() { s[3] = 0; }", "test.c");
    let mut collector = DiagnosticCollector::new();
    registry.run(&stream, &settings, &mut collector);
    assert!(collector.is_empty());

    registry.run(&stream, &CheckConfig::default(), &mut collector);
    let ids: Vec<_> = collector.diagnostics().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["arrayIndexOutOfBounds", "semicolons"]);
}

#[test]
fn test_error_list() {
    let mut all: Vec<Diagnostic> = Vec::new();
    CheckRegistry::builtin().error_messages(&mut all);

    let ids: Vec<_> = all.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "arrayIndexOutOfBounds",
            "bufferOverrun",
            "dangerousFunctionmktemp",
            "dangerousFunctiongets",
            "dangerousFunctionscanf",
            "unvalidatedInput",
        ]
    );
    assert!(all.iter().all(|d| d.location().is_none()));
}

//! Buffer overruns
//!
//! Locates fixed size arrays and checks constant accesses to them:
//! indexing with a literal past the end, and `strcpy` of a string literal
//! that does not fit.

use flowcheck_core::config::CheckConfig;
use flowcheck_core::{Diagnostic, Location, Severity};
use flowcheck_parser::{Captures, Pattern, TokenId, TokenStream};
use tracing::trace;

use crate::logger::ErrorLogger;
use crate::CheckDescriptor;

pub const NAME: &str = "buffer_overrun";

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor {
        name: NAME,
        description: "Constant array indexes and string copies past the end of an array",
        run: buffer_overrun,
        error_messages,
    }
}

fn with_location(diag: Diagnostic, location: Option<Location>) -> Diagnostic {
    match location {
        Some(location) => diag.at(location),
        None => diag,
    }
}

fn array_index_out_of_bounds(location: Option<Location>) -> Diagnostic {
    with_location(
        Diagnostic::new("arrayIndexOutOfBounds", Severity::Error, "Array index out of bounds"),
        location,
    )
}

fn buffer_overrun_error(location: Option<Location>) -> Diagnostic {
    with_location(
        Diagnostic::new("bufferOverrun", Severity::Error, "Buffer overrun"),
        location,
    )
}

/// Size in bytes of one element of a standard type
fn element_size(type_name: &str) -> u64 {
    match type_name {
        "char" | "bool" => 1,
        "short" => 2,
        "double" | "long" | "size_t" => 8,
        _ => 4,
    }
}

/// Bytes a string literal token occupies, terminator included
fn literal_size(literal: &str) -> u64 {
    let body = literal
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(literal);
    let mut size = 1;
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        }
        size += 1;
    }
    size
}

/// A local or global array with a constant size
struct Array {
    name: TokenId,
    var_id: u32,
    size: u64,
    total_size: u64,
}

fn declared_arrays(stream: &TokenStream) -> Vec<Array> {
    let declaration = Pattern::compile("%var% %var% [ %num% ] ;");
    let mut arrays = Vec::new();

    for tok in stream.iter() {
        if !stream[tok].is_standard_type() {
            continue;
        }
        let mut captures = Captures::default();
        if !declaration.matches_with(stream, Some(tok), 0, Some(&mut captures)) {
            continue;
        }
        let Some(name) = captures.var2 else {
            continue;
        };
        let Ok(size) = stream.str_at(tok, 3).parse::<u64>() else {
            continue;
        };
        let var_id = stream[name].var_id();
        if var_id == 0 {
            continue;
        }
        let Some(total_size) = size.checked_mul(element_size(stream[tok].text())) else {
            trace!("Array {} is too large to track", stream[name].text());
            continue;
        };
        arrays.push(Array {
            name,
            var_id,
            size,
            total_size,
        });
    }
    arrays
}

/// Report constant out of bounds accesses to fixed size arrays
pub fn buffer_overrun(stream: &TokenStream, _settings: &CheckConfig, logger: &mut dyn ErrorLogger) {
    let index = Pattern::compile("%varid% [ %num% ]");
    let strcpy = Pattern::compile("strcpy ( %varid% , %str% )");

    for array in declared_arrays(stream) {
        trace!(
            "Array {} [{}] has var id {}",
            stream[array.name].text(),
            array.size,
            array.var_id
        );

        // the declaration itself is skipped
        let start = stream.tok_at(array.name, 4);
        for tok in stream.iter_from(start) {
            if index.matches_varid(stream, Some(tok), array.var_id) {
                let past_end = stream
                    .str_at(tok, 2)
                    .parse::<u64>()
                    .is_ok_and(|i| i >= array.size);
                if past_end {
                    logger.report(array_index_out_of_bounds(Some(stream.location(tok))));
                }
            } else if strcpy.matches_varid(stream, Some(tok), array.var_id)
                && literal_size(stream.str_at(tok, 4)) > array.total_size
            {
                logger.report(buffer_overrun_error(Some(stream.location(tok))));
            }
        }
    }
}

fn error_messages(logger: &mut dyn ErrorLogger) {
    logger.report(array_index_out_of_bounds(None));
    logger.report(buffer_overrun_error(None));
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcheck_parser::tokenize;
    use pretty_assertions::assert_eq;

    fn check(code: &str) -> Vec<String> {
        let stream = tokenize(code, "test.c");
        let mut found: Vec<Diagnostic> = Vec::new();
        buffer_overrun(&stream, &CheckConfig::default(), &mut found);
        found.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_literal_size() {
        assert_eq!(literal_size("\"abc\""), 4);
        assert_eq!(literal_size("\"\""), 1);
        assert_eq!(literal_size("\"a\\n\""), 3);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let code = "void f()\n{\n    char str[10];\n    str[9] = 0;\n    str[10] = 0;\n}\n";
        assert_eq!(check(code), ["[test.c:5]: (error) Array index out of bounds"]);
    }

    #[test]
    fn test_index_in_expression() {
        let code = "int a[2];\nvoid f()\n{\n    int x = a[0] + a[2];\n}\n";
        assert_eq!(check(code), ["[test.c:4]: (error) Array index out of bounds"]);
    }

    #[test]
    fn test_strcpy() {
        let code = "void f()\n{\n    char buf[4];\n    strcpy(buf, \"abc\");\n    strcpy(buf, \"abcd\");\n}\n";
        assert_eq!(check(code), ["[test.c:5]: (error) Buffer overrun"]);
    }

    #[test]
    fn test_scopes_are_separate() {
        let code = "void f()\n{\n    char s[2];\n}\nvoid g()\n{\n    char s[20];\n    s[10] = 0;\n}\n";
        assert!(check(code).is_empty());
    }

    #[test]
    fn test_huge_array_size() {
        assert!(check("void f() { int a[5000000000000000000]; a[1] = 0; }").is_empty());
        assert!(check("void f() { char a[99999999999999999999]; a[1] = 0; }").is_empty());
        assert_eq!(
            check("void f() { char a[5000000000000000000]; a[5000000000000000000] = 0; }"),
            ["[test.c:1]: (error) Array index out of bounds"]
        );
    }

    #[test]
    fn test_element_size() {
        assert_eq!(element_size("char"), 1);
        assert_eq!(element_size("short"), 2);
        assert_eq!(element_size("int"), 4);
        assert_eq!(element_size("double"), 8);
    }

    #[test]
    fn test_non_constant_index_ignored() {
        assert!(check("void f(int i) { char s[2]; s[i] = 0; }").is_empty());
    }

    #[test]
    fn test_error_messages() {
        let mut all: Vec<Diagnostic> = Vec::new();
        error_messages(&mut all);
        let ids: Vec<_> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["arrayIndexOutOfBounds", "bufferOverrun"]);
    }
}

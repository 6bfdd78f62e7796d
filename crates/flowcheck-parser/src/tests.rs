//! Extended tests for the FlowCheck parser
//!
//! These tests run source text through the preprocessor and tokenizer and
//! query the result with patterns, the way checks use the crate.

use super::*;
use pretty_assertions::assert_eq;

fn tokens_for(code: &str, cfg: &str) -> TokenStream {
    let file = Preprocessor::default()
        .preprocess_deferred(code.as_bytes(), None)
        .unwrap();
    tokenize(&file.code_for(cfg), "test.c")
}

/// Each configuration yields its own token stream
#[test]
fn test_configuration_token_streams() {
    let source = r#"
#ifdef WIN32
int a;
#else
int b;
#endif
"#;
    let win = tokens_for(source, "WIN32");
    assert_eq!(win.to_text(), "int a ;");
    assert_eq!(win[win.head().unwrap()].line(), 3);

    let other = tokens_for(source, "");
    assert_eq!(other.to_text(), "int b ;");
    assert_eq!(other[other.head().unwrap()].line(), 5);
}

/// Macro values reach the tokens; line numbers still refer to the source
#[test]
fn test_macro_expansion_keeps_lines() {
    let source = "#define SIZE 10\n\nchar buf[SIZE];\nbuf[SIZE] = 0;\n";
    let stream = tokens_for(source, "");
    assert_eq!(stream.to_text(), "char buf [ 10 ] ;\nbuf [ 10 ] = 0 ;");

    let pattern = Pattern::compile("%var% [ %num% ] =");
    let hit = pattern.find(&stream, stream.head(), 0).unwrap();
    assert_eq!(stream.location(hit).line, 4);
}

/// Declaration pattern captures the declared array and its uses by id
#[test]
fn test_array_declaration_and_uses() {
    let source = r#"
void f()
{
    char str[10];
    str[10] = 0;
    int other[4];
    other[1] = str[2];
}
"#;
    let stream = tokens_for(source, "");
    let decl = Pattern::compile("char %var% [ %num% ] ;");
    let start = decl.find(&stream, stream.head(), 0).unwrap();
    let mut captures = Captures::default();
    assert!(decl.matches_with(&stream, Some(start), 0, Some(&mut captures)));

    let name = captures.var1.unwrap();
    assert_eq!(stream[name].text(), "str");
    let var_id = stream[name].var_id();
    assert_ne!(var_id, 0);

    let uses: Vec<_> = stream
        .iter_from(stream.next(name))
        .filter(|&id| token_match_varid(&stream, Some(id), "%varid% [", var_id))
        .map(|id| stream.location(id).line)
        .collect();
    assert_eq!(uses, [5, 7]);
}

/// Include markers move tokens into the header and back
#[test]
fn test_included_header_locations() {
    let temp = tempfile::TempDir::new().unwrap();
    let header = temp.path().join("defs.h");
    std::fs::write(&header, "#define LIMIT 3\nint shared;\n").unwrap();
    let main = temp.path().join("main.c");
    std::fs::write(&main, "#include \"defs.h\"\nint local[LIMIT];\n").unwrap();

    let pre = Preprocessor::new(PreprocessOptions {
        expand_includes: true,
        ..Default::default()
    });
    let file = pre.preprocess_file(&main).unwrap();
    let stream = tokenize(&file.code_for(""), &main.to_string_lossy());

    let shared = find_token(&stream, stream.head(), &["shared"]).unwrap();
    let location = stream.location(shared);
    assert_eq!(location.file, header.to_string_lossy());
    assert_eq!(location.line, 2);

    let local = find_token(&stream, stream.head(), &["local"]).unwrap();
    let location = stream.location(local);
    assert_eq!(location.file, main.to_string_lossy());
    assert_eq!(location.line, 2);
    assert!(token_match(&stream, Some(local), "local [ 3 ] ;"));
}

/// Calls are found behind optional atoms and alternatives
#[test]
fn test_call_queries() {
    let source = "void f() { char s[5]; gets(s); scanf(\"%d\", &n); }\n";
    let stream = tokens_for(source, "");

    let call = find_match(&stream, stream.head(), "gets|scanf (", 0).unwrap();
    assert_eq!(stream[call].text(), "gets");
    let call = find_match(&stream, stream.next(call), "gets|scanf (", 0).unwrap();
    assert_eq!(stream[call].text(), "scanf");
    assert!(token_match(&stream, Some(call), "scanf ( %str% , & %var% )"));

    assert!(token_match(&stream, stream.head(), "void f ( void| ) {"));
    assert_eq!(multi_compare("gets|scanf", stream.str_at(call, 0)), MultiCompare::Found);
}

/// Malformed input degrades instead of failing
#[test]
fn test_malformed_input() {
    let source = "#ifdef A\nint x = \"open;\n/* never closed\n#endif\n";
    let pre = Preprocessor::default();
    let file = pre.preprocess_deferred(source.as_bytes(), None).unwrap();
    assert_eq!(file.configurations, ["A"]);

    for cfg in file.all_configurations() {
        let stream = tokenize(&file.code_for(cfg), "bad.c");
        assert!(stream.len() <= 4);
    }
}

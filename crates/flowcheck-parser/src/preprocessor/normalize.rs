//! Source normalization
//!
//! Cleanup passes that run before directives are scanned. None of them
//! changes the number of lines.

use regex::{Captures, Regex};
use std::io::Read;
use std::sync::LazyLock;

use super::PreprocessError;

static IF_DEFINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*#[ \t]*if[ \t]+(!?)[ \t]*defined[ \t]*(?:\([ \t]*(\w+)[ \t]*\)|[ \t]+(\w+))[ \t]*$",
    )
    .expect("#if defined pattern is valid")
});

/// Read a whole source stream.
///
/// Invalid UTF-8 is replaced rather than rejected. Carriage returns are
/// dropped, backslash-newline continuations are joined and comments are
/// removed; the newlines they contained are kept so line numbers stay valid.
pub fn read<R: Read>(mut input: R) -> Result<String, PreprocessError> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(strip_comments(&text))
}

fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().filter(|&c| c != '\r').collect();
    let mut out = String::with_capacity(chars.len());
    // newlines swallowed by continuations, re-emitted after the logical line
    let mut pending = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                pending += 1;
                i += 2;
            }
            '\n' => {
                out.push('\n');
                out.extend(std::iter::repeat('\n').take(pending));
                pending = 0;
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i = (i + 2).min(chars.len());
                out.push(' ');
            }
            '"' | '\'' => {
                out.push(c);
                i += 1;
                while i < chars.len() && chars[i] != '\n' {
                    let d = chars[i];
                    if d == '\\' && i + 1 < chars.len() && chars[i + 1] != '\n' {
                        out.push(d);
                        out.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    out.push(d);
                    i += 1;
                    if d == c {
                        break;
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out.extend(std::iter::repeat('\n').take(pending));
    out
}

/// Remove spaces and tabs that have a newline directly on their left or
/// right side. Newlines are kept.
pub fn remove_space_near_nl(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    for c in text.chars() {
        match c {
            ' ' | '\t' => run.push(c),
            '\n' => {
                run.clear();
                out.push('\n');
            }
            _ => {
                if !run.is_empty() {
                    if !out.ends_with('\n') {
                        out.push_str(&run);
                    }
                    run.clear();
                }
                out.push(c);
            }
        }
    }
    if !out.ends_with('\n') {
        out.push_str(&run);
    }
    out
}

/// Rewrite `#if defined(X)` / `#if defined X` as `#ifdef X` and the negated
/// forms as `#ifndef X`. Compound conditions are left alone.
pub fn replace_if_defined(text: &str) -> String {
    IF_DEFINED
        .replace_all(text, |caps: &Captures| {
            let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            if &caps[1] == "!" {
                format!("#ifndef {name}")
            } else {
                format!("#ifdef {name}")
            }
        })
        .into_owned()
}

//! Object-like macro expansion

use std::collections::HashMap;

use super::split_directive;

/// A `#define` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    /// Replacement text, empty for `#define NAME`
    pub value: String,
    /// Has a parameter list; such macros are never expanded
    pub function_like: bool,
}

impl MacroDefinition {
    /// Parse a `#define` line. `None` for other lines or a missing name.
    pub fn parse(line: &str) -> Option<Self> {
        let (keyword, rest) = split_directive(line)?;
        if keyword != "define" {
            return None;
        }

        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_len);
        if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            value: tail.trim().to_string(),
            function_like: tail.starts_with('('),
        })
    }
}

/// Substitute object-like macros.
///
/// Each `#define` applies from its own line onward until a matching
/// `#undef`. Identifiers outside string and character literals are replaced
/// once; replacement text is not scanned again. `#define` and `#undef` lines
/// become empty lines and other directive lines are copied unchanged.
pub fn expand_macros(code: &str) -> String {
    let mut macros: HashMap<String, String> = HashMap::new();
    let mut out = String::with_capacity(code.len());

    for line in code.lines() {
        match split_directive(line) {
            Some(("define", _)) => {
                if let Some(def) = MacroDefinition::parse(line) {
                    if def.function_like {
                        macros.remove(&def.name);
                    } else {
                        macros.insert(def.name, def.value);
                    }
                }
            }
            Some(("undef", rest)) => {
                if let Some(name) = rest.split_whitespace().next() {
                    macros.remove(name);
                }
            }
            Some(_) => out.push_str(line),
            None if macros.is_empty() => out.push_str(line),
            None => substitute_line(line, &macros, &mut out),
        }
        out.push('\n');
    }
    out
}

fn substitute_line(line: &str, macros: &HashMap<String, String>, out: &mut String) {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' || c == '\'' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                i += if chars[i] == '\\' { 2 } else { 1 };
            }
            i = (i + 1).min(chars.len());
            out.extend(&chars[start..i]);
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            // numbers such as 0x1F keep their suffix letters
            match macros.get(&word) {
                Some(value) if !c.is_ascii_digit() => out.push_str(value),
                _ => out.push_str(&word),
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
}

//! Token pattern matching
//!
//! A pattern is a space separated list of atoms. Each atom is compared with
//! one token:
//!
//! - `%any%` any token
//! - `%var%` a name or type, e.g. `hello` or `int`
//! - `%num%` a numeric token, e.g. `23`
//! - `%str%` a string literal (token starting with `"`)
//! - `%varid%` a token whose variable id equals the id passed to the match
//! - `[abc]` a one character token that is `a`, `b` or `c`
//! - `int|void|char` any of the strings
//! - `int|void|char|` any of the strings, or nothing at all: when the token
//!   is none of them the atom is skipped and the next atom is compared with
//!   the same token
//! - anything else must equal the token text
//!
//! Matching walks atoms and tokens in lock step and never backtracks.
//!
//! ```
//! use flowcheck_parser::lexer::tokenize;
//! use flowcheck_parser::pattern::Pattern;
//!
//! let tokens = tokenize("foo ( ) { }", "test.c");
//! let pattern = Pattern::compile("foo ( int|void|char| )");
//! assert!(pattern.matches(&tokens, tokens.head()));
//! ```

use crate::token::{TokenId, TokenStream};

/// Outcome of [`multi_compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiCompare {
    /// A non-empty alternative equals the haystack
    Found,
    /// No alternative matched, but one of them is empty
    EmptyMatch,
    NotFound,
}

/// Compare `haystack` with the `|`-separated alternatives of `needle`.
///
/// `multi_compare("one|two", "two")` is `Found`, `multi_compare("|one", "x")`
/// is `EmptyMatch` and `multi_compare("one|two", "three")` is `NotFound`.
pub fn multi_compare(needle: &str, haystack: &str) -> MultiCompare {
    let mut has_empty = false;
    for alternative in needle.split('|') {
        if alternative.is_empty() {
            has_empty = true;
        } else if alternative == haystack {
            return MultiCompare::Found;
        }
    }
    if has_empty {
        MultiCompare::EmptyMatch
    } else {
        MultiCompare::NotFound
    }
}

/// One position of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Literal(String),
    /// Raw `|`-joined needle, compared with [`multi_compare`]
    Alternatives(String),
    Any,
    Var,
    Num,
    Str,
    VarId,
    CharClass(Vec<char>),
}

impl Atom {
    fn parse(atom: &str) -> Self {
        match atom {
            "%any%" => Atom::Any,
            "%var%" => Atom::Var,
            "%num%" => Atom::Num,
            "%str%" => Atom::Str,
            "%varid%" => Atom::VarId,
            // operators spelled with a bar
            "|" | "||" | "|=" => Atom::Literal(atom.to_string()),
            _ if atom.len() > 2 && atom.starts_with('[') && atom.ends_with(']') => {
                Atom::CharClass(atom[1..atom.len() - 1].chars().collect())
            }
            _ if atom.contains('|') => Atom::Alternatives(atom.to_string()),
            _ => Atom::Literal(atom.to_string()),
        }
    }

    /// Can match with zero width
    pub fn is_optional(&self) -> bool {
        match self {
            Atom::Alternatives(needle) => needle.split('|').any(str::is_empty),
            _ => false,
        }
    }
}

/// Tokens bound by the first two `%var%` atoms of a successful match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Captures {
    pub var1: Option<TokenId>,
    pub var2: Option<TokenId>,
}

/// A compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    atoms: Vec<Atom>,
}

impl Pattern {
    /// Compile a pattern string. Every string is a valid pattern.
    pub fn compile(pattern: &str) -> Self {
        Self {
            atoms: pattern.split_whitespace().map(Atom::parse).collect(),
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Match starting at `start`
    pub fn matches(&self, stream: &TokenStream, start: Option<TokenId>) -> bool {
        self.matches_with(stream, start, 0, None)
    }

    /// Match with a variable id for `%varid%` atoms
    pub fn matches_varid(&self, stream: &TokenStream, start: Option<TokenId>, var_id: u32) -> bool {
        self.matches_with(stream, start, var_id, None)
    }

    /// Match starting at `start`.
    ///
    /// `%varid%` atoms only match tokens whose id is `var_id`; an id of `0`
    /// never matches. When `captures` is given it receives the tokens bound
    /// by `%var%` atoms, and is left untouched if the match fails.
    pub fn matches_with(
        &self,
        stream: &TokenStream,
        start: Option<TokenId>,
        var_id: u32,
        captures: Option<&mut Captures>,
    ) -> bool {
        let mut cursor = start;
        let mut bound = Captures::default();
        let mut vars = 0;

        for atom in &self.atoms {
            let Some((id, token)) = cursor.and_then(|id| stream.get(id).map(|t| (id, t))) else {
                if atom.is_optional() {
                    continue;
                }
                return false;
            };

            let matched = match atom {
                Atom::Literal(text) => token.text() == text,
                Atom::Alternatives(needle) => match multi_compare(needle, token.text()) {
                    MultiCompare::Found => true,
                    MultiCompare::EmptyMatch => continue,
                    MultiCompare::NotFound => false,
                },
                Atom::Any => true,
                Atom::Var => {
                    if token.is_name() {
                        match vars {
                            0 => bound.var1 = Some(id),
                            1 => bound.var2 = Some(id),
                            _ => {}
                        }
                        vars += 1;
                    }
                    token.is_name()
                }
                Atom::Num => token.is_number(),
                Atom::Str => token.first_char() == Some('"'),
                Atom::VarId => var_id != 0 && token.var_id() == var_id,
                Atom::CharClass(chars) => {
                    let mut it = token.text().chars();
                    matches!((it.next(), it.next()), (Some(c), None) if chars.contains(&c))
                }
            };

            if !matched {
                return false;
            }
            cursor = stream.next(id);
        }

        if let Some(out) = captures {
            *out = bound;
        }
        true
    }

    /// First token at or after `start` where the pattern matches
    pub fn find(&self, stream: &TokenStream, start: Option<TokenId>, var_id: u32) -> Option<TokenId> {
        stream
            .iter_from(start)
            .find(|&id| self.matches_with(stream, Some(id), var_id, None))
    }
}

impl From<&str> for Pattern {
    fn from(pattern: &str) -> Self {
        Self::compile(pattern)
    }
}

/// Compile and match in one call
pub fn token_match(stream: &TokenStream, start: Option<TokenId>, pattern: &str) -> bool {
    Pattern::compile(pattern).matches(stream, start)
}

/// Compile and match in one call, with a variable id for `%varid%`
pub fn token_match_varid(
    stream: &TokenStream,
    start: Option<TokenId>,
    pattern: &str,
    var_id: u32,
) -> bool {
    Pattern::compile(pattern).matches_varid(stream, start, var_id)
}

/// Scan forward for the first position where `pattern` matches
pub fn find_match(
    stream: &TokenStream,
    start: Option<TokenId>,
    pattern: &str,
    var_id: u32,
) -> Option<TokenId> {
    Pattern::compile(pattern).find(stream, start, var_id)
}

/// Scan forward for the first token whose text is one of `candidates`
pub fn find_token(stream: &TokenStream, start: Option<TokenId>, candidates: &[&str]) -> Option<TokenId> {
    stream
        .iter_from(start)
        .find(|&id| candidates.contains(&stream[id].text()))
}

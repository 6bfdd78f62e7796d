//! Token stream
//!
//! Tokens are stored in an arena owned by [`TokenStream`]. Every entry keeps
//! the id of its successor, which gives O(1) successor access and in-place
//! splicing. Slots of removed tokens are never reused, so a [`TokenId`] can
//! not silently start referring to another token.

use flowcheck_core::Location;
use std::ops::Index;

/// Keywords that name a builtin type
const STANDARD_TYPES: &[&str] = &[
    "bool", "char", "short", "int", "long", "float", "double", "void", "signed", "unsigned",
    "size_t", "wchar_t",
];

/// Handle of a token inside its [`TokenStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(usize);

/// One lexical unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    is_name: bool,
    is_number: bool,
    is_standard_type: bool,
    var_id: u32,
    file_index: u32,
    line: u32,
    next: Option<TokenId>,
}

impl Token {
    fn new(text: &str, file_index: u32, line: u32) -> Self {
        let mut token = Self {
            text: String::new(),
            is_name: false,
            is_number: false,
            is_standard_type: false,
            var_id: 0,
            file_index,
            line,
            next: None,
        };
        token.assign(text);
        token
    }

    fn assign(&mut self, text: &str) {
        self.text = text.to_string();
        self.is_name = is_name_text(text);
        self.is_number = is_number_text(text);
        self.is_standard_type = STANDARD_TYPES.contains(&text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// First character of the text
    pub fn first_char(&self) -> Option<char> {
        self.text.chars().next()
    }

    /// Identifier or keyword
    pub fn is_name(&self) -> bool {
        self.is_name
    }

    pub fn is_number(&self) -> bool {
        self.is_number
    }

    /// Builtin type keyword such as `int` or `unsigned`
    pub fn is_standard_type(&self) -> bool {
        self.is_standard_type
    }

    /// Variable id, `0` when the token is not a known variable
    pub fn var_id(&self) -> u32 {
        self.var_id
    }

    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn next(&self) -> Option<TokenId> {
        self.next
    }
}

/// Letter or underscore first
pub fn is_name_text(text: &str) -> bool {
    text.chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
}

/// Exactly one decimal literal: optional sign, digits, at most one dot
pub fn is_number_text(text: &str) -> bool {
    let body = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Ordered chain of tokens for one source unit
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    slots: Vec<Option<Token>>,
    head: Option<TokenId>,
    tail: Option<TokenId>,
    len: usize,
    files: Vec<String>,
}

impl TokenStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file name and return its index. Known names keep their index.
    pub fn add_file(&mut self, name: &str) -> u32 {
        if let Some(pos) = self.files.iter().position(|f| f == name) {
            return pos as u32;
        }
        self.files.push(name.to_string());
        (self.files.len() - 1) as u32
    }

    pub fn file_name(&self, index: u32) -> Option<&str> {
        self.files.get(index as usize).map(String::as_str)
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Append a token at the end of the chain
    pub fn push_back(&mut self, text: &str, file_index: u32, line: u32) -> TokenId {
        let id = TokenId(self.slots.len());
        self.slots.push(Some(Token::new(text, file_index, line)));

        match self.tail.and_then(|t| self.slots[t.0].as_mut()) {
            Some(last) => last.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    /// First token
    pub fn head(&self) -> Option<TokenId> {
        self.head
    }

    /// Number of tokens in the chain
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Token for `id`, `None` if it has been removed
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Successor of `id`
    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.get(id).and_then(|t| t.next)
    }

    /// Token reached by following `k` successor links. `tok_at(id, 0)` is `id`.
    pub fn tok_at(&self, id: TokenId, k: usize) -> Option<TokenId> {
        let mut current = self.get(id).map(|_| id);
        for _ in 0..k {
            current = self.next(current?);
        }
        current
    }

    /// Text of `tok_at(id, k)`, empty past the end
    pub fn str_at(&self, id: TokenId, k: usize) -> &str {
        self.tok_at(id, k)
            .and_then(|t| self.get(t))
            .map(Token::text)
            .unwrap_or("")
    }

    /// Replace the text of a token and recompute its flags
    pub fn set_text(&mut self, id: TokenId, text: &str) {
        if let Some(token) = self.slots.get_mut(id.0).and_then(Option::as_mut) {
            token.assign(text);
        }
    }

    pub fn set_var_id(&mut self, id: TokenId, var_id: u32) {
        if let Some(token) = self.slots.get_mut(id.0).and_then(Option::as_mut) {
            token.var_id = var_id;
        }
    }

    /// Merge `id` with its successor when their texts are `first` and
    /// `second`, e.g. "<" and "=" become "<=". Returns whether the merge
    /// happened; on mismatch nothing changes.
    pub fn combine_with_next(&mut self, id: TokenId, first: &str, second: &str) -> bool {
        if self.next(id).is_none() || self.str_at(id, 0) != first || self.str_at(id, 1) != second {
            return false;
        }
        let merged = format!("{first}{second}");
        self.delete_next(id);
        self.set_text(id, &merged);
        true
    }

    /// Unlink and drop the successor of `id`. Returns `false` if there is none.
    pub fn delete_next(&mut self, id: TokenId) -> bool {
        let Some(next) = self.next(id) else {
            return false;
        };
        let after = self.slots[next.0].take().and_then(|t| t.next);
        if let Some(token) = self.slots[id.0].as_mut() {
            token.next = after;
        }
        if self.tail == Some(next) {
            self.tail = Some(id);
        }
        self.len -= 1;
        true
    }

    /// Iterate over the chain from the head
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stream: self,
            cursor: self.head,
        }
    }

    /// Iterate over the chain starting at `id`
    pub fn iter_from(&self, id: Option<TokenId>) -> Iter<'_> {
        Iter {
            stream: self,
            cursor: id.filter(|i| self.get(*i).is_some()),
        }
    }

    /// File and line of a token
    pub fn location(&self, id: TokenId) -> Location {
        match self.get(id) {
            Some(token) => Location::new(
                self.file_name(token.file_index).unwrap_or_default(),
                token.line,
            ),
            None => Location::new("", 0),
        }
    }

    /// Tokens joined by spaces, one output line per source line change
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut line = None;
        for id in self.iter() {
            let token = &self[id];
            match line {
                Some(l) if l != token.line => out.push('\n'),
                Some(_) => out.push(' '),
                None => {}
            }
            line = Some(token.line);
            out.push_str(&token.text);
        }
        out
    }
}

impl Index<TokenId> for TokenStream {
    type Output = Token;

    /// # Panics
    ///
    /// Panics when `id` refers to a removed token.
    fn index(&self, id: TokenId) -> &Token {
        match self.get(id) {
            Some(token) => token,
            None => panic!("token {:?} is not part of the stream", id),
        }
    }
}

/// Iterator over token ids in chain order
pub struct Iter<'a> {
    stream: &'a TokenStream,
    cursor: Option<TokenId>,
}

impl Iterator for Iter<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let current = self.cursor?;
        self.cursor = self.stream.next(current);
        Some(current)
    }
}

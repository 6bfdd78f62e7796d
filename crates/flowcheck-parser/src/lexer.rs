//! Tokenizer
//!
//! Turns preprocessed source text into a [`TokenStream`]. The tokenizer is
//! total: unterminated comments and literals simply end at end of input.
//!
//! Directive lines are skipped, except the include markers written by
//! [`crate::preprocessor::handle_includes`]: `#file "path"` switches tokens to
//! the included file (line 1 on the next line) and `#endfile` returns to the
//! including file.

use crate::pattern::{Captures, Pattern};
use crate::token::{TokenId, TokenStream};
use tracing::debug;

/// Operator pairs merged when written without space between them
const OPERATOR_PAIRS: &[(&str, &str)] = &[
    ("<", "="),
    (">", "="),
    ("=", "="),
    ("!", "="),
    ("&", "&"),
    ("|", "|"),
    ("-", ">"),
    (":", ":"),
    ("+", "+"),
    ("-", "-"),
    ("<", "<"),
    (">", ">"),
    ("+", "="),
    ("-", "="),
    ("*", "="),
    ("/", "="),
    ("%", "="),
    ("&", "="),
    ("|", "="),
    ("^", "="),
    ("<<", "="),
    (">>", "="),
];

/// Words that never start or name a declaration
const KEYWORDS: &[&str] = &[
    "return", "else", "goto", "case", "default", "delete", "new", "throw", "sizeof", "typedef",
    "if", "while", "for", "switch", "do", "break", "continue", "struct", "class", "union",
    "enum", "const", "static", "extern", "register", "volatile", "public", "private",
    "protected", "operator",
];

/// Tokens after which a name may start a declaration
const TYPE_PREFIXES: &[&str] = &[
    "", ";", "{", "}", "(", ",", "const", "static", "struct", "class", "union", "enum", "extern",
    "register", "volatile", "signed", "unsigned",
];

/// Source tokenizer
pub struct Tokenizer {
    file_name: String,
}

impl Tokenizer {
    /// Create a tokenizer for code that came from `file_name`
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Tokenize code and assign variable ids
    pub fn tokenize(&self, code: &str) -> TokenStream {
        let mut stream = TokenStream::new();
        let root = stream.add_file(&self.file_name);
        Scanner::new(code, root).run(&mut stream);
        set_var_ids(&mut stream);
        debug!(
            "Tokenized {}: {} tokens, {} files",
            self.file_name,
            stream.len(),
            stream.files().len()
        );
        stream
    }
}

/// Tokenize code in one call
pub fn tokenize(code: &str, file_name: &str) -> TokenStream {
    Tokenizer::new(file_name).tokenize(code)
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    file: u32,
    line: u32,
    /// Files we returned from an include marker into: (file, line)
    includers: Vec<(u32, u32)>,
    at_line_start: bool,
    /// Operator token pushed right before the current position
    last_operator: Option<TokenId>,
}

impl Scanner {
    fn new(code: &str, file: u32) -> Self {
        Self {
            chars: code.chars().collect(),
            pos: 0,
            file,
            line: 1,
            includers: Vec::new(),
            at_line_start: true,
            last_operator: None,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self, stream: &mut TokenStream) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                self.line += 1;
                self.pos += 1;
                self.at_line_start = true;
                self.last_operator = None;
                continue;
            }
            if c.is_whitespace() {
                self.pos += 1;
                self.last_operator = None;
                continue;
            }

            let line_start = std::mem::replace(&mut self.at_line_start, false);
            match c {
                '#' if line_start => self.directive(stream),
                '/' if self.peek(1) == Some('/') => self.skip_until_newline(),
                '/' if self.peek(1) == Some('*') => self.block_comment(),
                '"' | '\'' => {
                    let text = self.literal(c);
                    stream.push_back(&text, self.file, self.line);
                    self.last_operator = None;
                }
                _ if c.is_alphanumeric() || c == '_' => {
                    let text = self.word();
                    stream.push_back(&text, self.file, self.line);
                    self.last_operator = None;
                }
                '.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => {
                    let text = self.word();
                    stream.push_back(&text, self.file, self.line);
                    self.last_operator = None;
                }
                _ => self.operator(stream, c),
            }
        }
    }

    fn operator(&mut self, stream: &mut TokenStream, c: char) {
        self.pos += 1;
        let text = c.to_string();
        let id = stream.push_back(&text, self.file, self.line);

        if let Some(prev) = self.last_operator {
            let prev_text = stream.str_at(prev, 0).to_string();
            let merged = OPERATOR_PAIRS
                .iter()
                .any(|(a, b)| *a == prev_text && *b == text && stream.combine_with_next(prev, a, b));
            if merged {
                self.last_operator = Some(prev);
                return;
            }
        }
        self.last_operator = Some(id);
    }

    fn word(&mut self) -> String {
        let numeric = self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '.');
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' || (numeric && c == '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// String or char literal including its quotes. Ends at the closing
    /// quote, or before a newline when unterminated.
    fn literal(&mut self, quote: char) -> String {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            match c {
                '\\' if self.peek(1).is_some_and(|n| n != '\n') => self.pos += 2,
                '\n' => break,
                _ if c == quote => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_until_newline(&mut self) {
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }

    fn block_comment(&mut self) {
        self.pos += 2;
        while let Some(c) = self.peek(0) {
            if c == '*' && self.peek(1) == Some('/') {
                self.pos += 2;
                return;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn directive(&mut self, stream: &mut TokenStream) {
        let start = self.pos;
        self.skip_until_newline();
        let line: String = self.chars[start..self.pos].iter().collect();

        if let Some(rest) = line.strip_prefix("#file ") {
            let name = rest.trim().trim_matches('"');
            self.includers.push((self.file, self.line));
            self.file = stream.add_file(name);
            // the newline ending this marker moves to line 1
            self.line = 0;
        } else if line.trim_end() == "#endfile" {
            if let Some((file, line)) = self.includers.pop() {
                self.file = file;
                self.line = line;
            }
        }
    }
}

fn set_var_ids(stream: &mut TokenStream) {
    let declaration = Pattern::compile("%var% *|&| %var% [;=[,)]");
    let ids: Vec<TokenId> = stream.iter().collect();
    let mut next_var_id = 0;

    for (i, &tok) in ids.iter().enumerate() {
        let prev = if i == 0 { "" } else { stream[ids[i - 1]].text() };
        let token = &stream[tok];
        let type_position = !KEYWORDS.contains(&token.text())
            && (token.is_standard_type() || (token.is_name() && TYPE_PREFIXES.contains(&prev)));
        if !type_position {
            continue;
        }

        let mut captures = Captures::default();
        if !declaration.matches_with(stream, Some(tok), 0, Some(&mut captures)) {
            continue;
        }
        let Some(name) = captures.var2 else {
            continue;
        };
        let name_text = stream[name].text().to_string();
        if KEYWORDS.contains(&name_text.as_str()) || stream[name].is_standard_type() {
            continue;
        }

        let is_param = matches!(stream.str_at(name, 1), "," | ")");
        next_var_id += 1;
        assign_var_id(stream, name, &name_text, next_var_id, is_param);
    }
}

/// Give `var_id` to every use of `name` from the declaration to the end of
/// its scope. Parameters are scoped to the following function body.
fn assign_var_id(stream: &mut TokenStream, name: TokenId, text: &str, var_id: u32, is_param: bool) {
    let mut targets = Vec::new();
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut in_body = false;
    let mut after_member = false;

    for id in stream.iter_from(Some(name)) {
        let t = stream[id].text();
        match t {
            "{" => {
                braces += 1;
                in_body = true;
            }
            "}" => {
                braces -= 1;
                if braces < 0 || (is_param && braces == 0) {
                    break;
                }
            }
            "(" => parens += 1,
            ")" => parens -= 1,
            // prototype without a body
            ";" if is_param && !in_body && parens < 0 => break,
            _ => {}
        }
        if t == text && !after_member {
            targets.push(id);
        }
        after_member = t == "." || t == "->";
    }

    for id in targets {
        stream.set_var_id(id, var_id);
    }
}

//! FlowCheck Parser
//!
//! Lexical and query core of the FlowCheck analyzer: C/C++ source is
//! preprocessed into one text per configuration, tokenized into a
//! [`TokenStream`] and queried with compiled [`Pattern`]s.
//!
//! ## Modules
//!
//! - `preprocessor` - Configuration discovery, conditional blocks, macros, includes
//! - `lexer` - Tokenizer producing token streams with variable ids
//! - `token` - Arena-backed token chain
//! - `pattern` - Token pattern language

pub mod lexer;
pub mod pattern;
pub mod preprocessor;
pub mod token;

pub use lexer::{tokenize, Tokenizer};
pub use pattern::{
    find_match, find_token, multi_compare, token_match, token_match_varid, Captures,
    MultiCompare, Pattern,
};
pub use preprocessor::{PreprocessError, PreprocessOptions, PreprocessedFile, Preprocessor};
pub use token::{Token, TokenId, TokenStream};

#[cfg(test)]
mod tests;

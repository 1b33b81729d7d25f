//! Lumen Lexer
//!
//! Tokenizes `.lum` source files into a flat stream of positioned tokens.
//! Handles indentation-based structure (explicit Indent/Dedent markers),
//! the reserved-word table, string literals with verbatim `{expr}` spans,
//! color literals, at-keywords, and HTTP-method literals.
//!
//! # Example
//!
//! ```
//! use lumen_lexer::Scanner;
//!
//! let tokens = Scanner::tokenize("").unwrap();
//! assert_eq!(tokens.len(), 1); // Just EOF
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind, KEYWORDS};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, serde::Serialize, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

//! Lumen Parser
//!
//! Parses a token stream into an Abstract Syntax Tree: top-level
//! declarations (pages, components, models, backend surface), body
//! declarations (state, derived, functions, watches), UI elements with
//! inline properties, statements, and a full expression grammar with
//! operator precedence.
//!
//! The parser fails fast on the first structural error; multi-error
//! collection is the validator's job.

pub mod ast;
pub mod expr;
pub mod parser;

pub use ast::{Decl, Element, Expr, Item, Node, Stmt};
pub use parser::Parser;

/// Parser error with position information and expected-vs-actual detail.
#[derive(Debug, Clone, PartialEq, serde::Serialize, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

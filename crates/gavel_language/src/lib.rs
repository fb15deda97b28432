//! Lexer, parser and syntax tree for the Gavel rule language.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of rule source, including escape validation
//! - [`Parser`] - Parsing tokens into [`RuleDecl`] values
//! - [`pretty`] - Deterministic rendering of rules back to source
//! - [`visitor`] - Read-only traversal used for variable indexing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod span;
pub mod token;
pub mod visitor;

pub use ast::{
    AssignOp, Assignment, AstId, BinaryOp, Expr, ExprKind, RuleDecl, Statement, UnaryOp,
};
pub use lexer::Lexer;
pub use parser::{Parser, parse, parse_expression};
pub use span::Span;
pub use token::{Token, TokenKind};

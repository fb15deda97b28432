//! Integration tests for Layer 2: Language
//!
//! Tests for lexing, parsing, analysis, and pretty printing of rule source.

mod lexer;

//! Gavel - Forward-chaining business rule engine
//!
//! This crate re-exports all layers of the Gavel system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: gavel_engine     - Data context, working memory, knowledge bases, rule cycle
//! Layer 2: gavel_language   - Lexer, parser, AST, pretty printer
//! Layer 1: gavel_model      - Host-object introspection, value nodes
//! Layer 0: gavel_foundation - Core types (Value, Type, Error)
//! ```

pub use gavel_engine as engine;
pub use gavel_foundation as foundation;
pub use gavel_language as language;
pub use gavel_model as model;

//! Integration tests for Layer 3: Engine
//!
//! Tests for data contexts, knowledge bases, the library, and rule execution.

mod context;
mod execution;
mod knowledge;

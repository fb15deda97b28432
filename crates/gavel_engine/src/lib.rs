//! Data contexts, working memory, knowledge bases and the rule cycle for Gavel.
//!
//! This crate provides:
//! - [`DataContext`] - Named fact bindings visible to rules
//! - [`WorkingMemory`] - Fingerprints, the variable index and the condition memo
//! - [`KnowledgeBase`] - A versioned rule set with retraction flags
//! - [`KnowledgeLibrary`] and [`RuleBuilder`] - Compile once, instantiate many
//! - [`RuleEngine`] - Salience-ordered forward chaining to quiescence
//! - [`builtins`] - The standard native functions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builtins;
pub mod config;
pub mod context;
pub mod cycle;
pub mod eval;
pub mod knowledge;
pub mod library;
pub mod memory;

pub use builtins::{CallEnv, FunctionProvider, FunctionRegistry, NativeFunction};
pub use config::{DEFAULT_MAX_CYCLE, EngineConfig};
pub use context::{Binding, DEFUNC, DataContext};
pub use cycle::{ExecutionEvent, ExecutionListener, ExecutionReport, RecordingListener, RuleEngine};
pub use eval::Evaluator;
pub use knowledge::{KnowledgeBase, RuleEntry};
pub use library::{KnowledgeLibrary, RuleBuilder};
pub use memory::{RuleSummary, WorkingMemory};

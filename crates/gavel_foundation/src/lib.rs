//! Core values, type descriptors, and errors for Gavel.
//!
//! This crate provides:
//! - [`Value`] - The typed value every rule expression evaluates to
//! - [`Type`] - Type descriptors for runtime checks and diagnostics
//! - [`Arity`] - Argument counts for callables
//! - [`Error`] - Rich error types with rule and path context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use types::{Arity, Type};
pub use value::Value;

/// Re-exported so dependents name timestamps the same way.
pub use chrono::{DateTime, Utc};

//! End-to-end scenarios
//!
//! Rule sets run against host objects through the full stack: source text,
//! knowledge library, data context and rule cycle.

mod memoization;
mod retraction;

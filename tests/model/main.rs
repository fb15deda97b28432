//! Integration tests for Layer 1: Model
//!
//! Tests for value node navigation, mutation, and host methods.

mod methods;
mod navigation;

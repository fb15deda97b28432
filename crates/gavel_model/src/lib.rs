//! Host-object access for Gavel.
//!
//! Rules never see application structs directly. They see:
//! - [`Reflect`] - The capability protocol every host value implements
//! - [`record!`] - Field and method tables for application structs
//! - [`ValueNode`] - An addressable position inside a bound fact
//! - [`NodeArena`] - Per-evaluation storage for value nodes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dynamic;
mod impls;
pub mod kind;
pub mod methods;
pub mod node;
pub mod record;
pub mod reflect;

pub use dynamic::{Dynamic, HostFunction};
pub use kind::Kind;
pub use node::{NodeArena, NodeId, Selector, ValueNode};
pub use record::{Record, Schema};
pub use reflect::{Handle, HostType, Reflect, Shared, concrete, concrete_mut, shared};

pub use gavel_foundation::{Arity, Error, ErrorKind, Result, Type, Value};

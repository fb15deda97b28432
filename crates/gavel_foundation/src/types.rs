//! Type descriptors used for runtime type checking and error reporting.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for values and host slots.
///
/// Evaluation never checks types ahead of time; these descriptors exist so
/// that a failed operation can say what it wanted and what it got.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The nil type (absent value, empty pointer).
    Nil,
    /// Boolean type.
    Bool,
    /// Signed integer (any host width).
    Int,
    /// Floating point (any host width).
    Float,
    /// String type.
    String,
    /// UTC timestamp.
    Time,
    /// Homogeneous array.
    Array(Box<Type>),
    /// String-keyed map.
    Map(Box<Type>),
    /// Host record, by type name.
    Object(String),
    /// Polymorphic wrapper around some other host value.
    Interface,
    /// Callable host value.
    Function,
    /// Any type.
    Any,
}

impl Type {
    /// Creates an array type with the given element type.
    #[must_use]
    pub fn array(element: Type) -> Self {
        Self::Array(Box::new(element))
    }

    /// Creates a map type with the given value type.
    #[must_use]
    pub fn map(value: Type) -> Self {
        Self::Map(Box::new(value))
    }

    /// Creates an object type descriptor.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// Returns true for int and float.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Checks whether a value of type `actual` may be stored where `self` is expected.
    ///
    /// The only implicit conversion is int into float.
    #[must_use]
    pub fn accepts(&self, actual: &Type) -> bool {
        match (self, actual) {
            (Self::Any, _)
            | (Self::Float, Self::Int)
            | (Self::Nil, Self::Nil)
            | (Self::Bool, Self::Bool)
            | (Self::Int, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::String, Self::String)
            | (Self::Time, Self::Time)
            | (Self::Interface, _)
            | (Self::Function, Self::Function) => true,
            (Self::Array(expected), Self::Array(elem)) => elem.as_ref() == &Self::Any || expected.accepts(elem),
            (Self::Map(expected), Self::Map(elem)) => elem.as_ref() == &Self::Any || expected.accepts(elem),
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Time => write!(f, "time"),
            Self::Array(t) => write!(f, "array<{t:?}>"),
            Self::Map(t) => write!(f, "map<string, {t:?}>"),
            Self::Object(name) => write!(f, "{name}"),
            Self::Interface => write!(f, "interface"),
            Self::Function => write!(f, "function"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Function arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Arity {
    /// Exactly N arguments.
    Exact(usize),
    /// Between min and max arguments (inclusive).
    Range(usize, usize),
    /// At least N arguments.
    Variadic(usize),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::Variadic(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
            Self::Variadic(min) => write!(f, "at least {min}"),
        }
    }
}

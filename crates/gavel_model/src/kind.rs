//! Capability tags for host values.

use std::fmt;

/// What a host value can do.
///
/// A kind is always derived from the live value, never stored, so a field
/// holding an `Option` reports [`Kind::Nil`] until it is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Absent value or empty optional.
    Nil,
    /// Boolean leaf.
    Bool,
    /// Integer leaf of any width.
    Int,
    /// Floating point leaf.
    Float,
    /// String leaf.
    String,
    /// Timestamp leaf.
    Time,
    /// Indexed sequence.
    Array,
    /// String-keyed map.
    Map,
    /// Record with named fields.
    Object,
    /// Wrapper around a concrete value of some other kind.
    Interface,
    /// Callable value.
    Function,
}

impl Kind {
    /// Returns true for kinds whose value can be snapshotted into a scalar.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Nil | Self::Bool | Self::Int | Self::Float | Self::String | Self::Time
        )
    }

    /// Returns true for int and float.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Time => "time",
            Self::Array => "array",
            Self::Map => "map",
            Self::Object => "object",
            Self::Interface => "interface",
            Self::Function => "function",
        };
        f.write_str(name)
    }
}

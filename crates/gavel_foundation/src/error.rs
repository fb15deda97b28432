//! Error types for the Gavel rule engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// The main error type for Gavel operations.
#[derive(Debug)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, "{context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Replaces the context of this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches the identity path of the value node involved, unless one is set.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        let context = self.context.get_or_insert_with(ErrorContext::new);
        if context.path.is_none() {
            context.path = Some(path.into());
        }
        self
    }

    /// Attaches the rule that was running, unless one is set.
    #[must_use]
    pub fn in_rule(mut self, rule: impl Into<String>) -> Self {
        let context = self.context.get_or_insert_with(ErrorContext::new);
        if context.rule.is_none() {
            context.rule = Some(rule.into());
        }
        self
    }

    /// Pushes a frame onto the context stack.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .stack
            .push(frame.into());
        self
    }

    /// Returns true for errors raised while building a rule base.
    #[must_use]
    pub const fn is_compile_time(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::LexicalError { .. }
                | ErrorKind::SyntaxError { .. }
                | ErrorKind::DuplicateRule(_)
        )
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an invalid operand error for a binary or unary operator.
    #[must_use]
    pub fn invalid_operand(op: impl Into<String>, left: Type, right: Option<Type>) -> Self {
        Self::new(ErrorKind::InvalidOperand {
            op: op.into(),
            left,
            right,
        })
    }

    /// Creates a no-such-field error.
    #[must_use]
    pub fn no_such_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchField {
            type_name: type_name.into(),
            field: field.into(),
        })
    }

    /// Creates a no-such-method error.
    #[must_use]
    pub fn no_such_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchMethod {
            type_name: type_name.into(),
            method: method.into(),
        })
    }

    /// Creates a key-not-found error.
    #[must_use]
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyNotFound(key.into()))
    }

    /// Creates an index-out-of-range error.
    #[must_use]
    pub fn index_out_of_range(index: usize, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfRange { index, length })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(name: impl Into<String>, expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            name: name.into(),
            expected,
            actual,
        })
    }

    /// Creates an error for an operation the value's capability does not support.
    #[must_use]
    pub fn not_applicable(operation: &'static str, kind: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotApplicable {
            operation,
            kind: kind.into(),
        })
    }

    /// Creates a lexical error.
    #[must_use]
    pub fn lexical(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::LexicalError {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::SyntaxError {
            message: message.into(),
            line,
            column,
        })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed token, including an unrecognized string escape.
    #[error("lexical error at {line}:{column}: {message}")]
    LexicalError {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// Malformed rule structure.
    #[error("syntax error at {line}:{column}: {message}")]
    SyntaxError {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A rule with this name already exists in the knowledge base.
    #[error("rule entry {0} already exists")]
    DuplicateRule(String),

    /// Value or condition of the wrong type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Operator applied to incompatible operands.
    #[error("{}", describe_operand(.op, .left, .right.as_ref()))]
    InvalidOperand {
        /// The operator.
        op: String,
        /// Type of the left (or only) operand.
        left: Type,
        /// Type of the right operand, for binary operators.
        right: Option<Type>,
    },

    /// Field does not exist on the host object.
    #[error("no such field: {field} on {type_name}")]
    NoSuchField {
        /// The host type.
        type_name: String,
        /// The field name.
        field: String,
    },

    /// Method does not exist on the host value.
    #[error("no such method: {method} on {type_name}")]
    NoSuchMethod {
        /// The host type.
        type_name: String,
        /// The method name.
        method: String,
    },

    /// Map lookup for a key that is not present.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Array access past the end.
    #[error("index out of range: {index} (length {length})")]
    IndexOutOfRange {
        /// The index that was accessed.
        index: usize,
        /// The length of the array.
        length: usize,
    },

    /// Wrong number of arguments to a function or method.
    #[error("arity mismatch calling {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Function or method name.
        name: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Navigation through an empty pointer or option.
    #[error("nil reference")]
    NilReference,

    /// Operation not supported by the value's capability.
    #[error("{operation} is not applicable to {kind}")]
    NotApplicable {
        /// The attempted operation.
        operation: &'static str,
        /// The capability or type the value has.
        kind: String,
    },

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow.
    #[error("arithmetic overflow in {0}")]
    Overflow(String),

    /// No fact bound under this name.
    #[error("undefined fact: {0}")]
    UndefinedFact(String),

    /// No function provider knows this name.
    #[error("undefined function: {0}")]
    UndefinedFunction(String),

    /// Name already bound in the data context.
    #[error("name already bound in data context: {0}")]
    DuplicateBinding(String),

    /// Rule name not present in the knowledge base.
    #[error("unknown rule: {0}")]
    UnknownRule(String),

    /// Knowledge base not registered in the library.
    #[error("unknown knowledge base: {name} version {version}")]
    UnknownKnowledgeBase {
        /// Knowledge base name.
        name: String,
        /// Knowledge base version.
        version: String,
    },

    /// Host fact is already borrowed elsewhere.
    #[error("fact {0} is already borrowed")]
    BorrowConflict(String),

    /// The rule set kept firing past the configured cycle limit.
    #[error("max cycle ({limit}) exceeded")]
    MaxCycleExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// Error raised by host code.
    #[error("{0}")]
    Host(String),
}

fn describe_operand(op: &str, left: &Type, right: Option<&Type>) -> String {
    match right {
        Some(right) => format!("type mismatch: cannot apply {op} to {left} and {right}"),
        None => format!("type mismatch: cannot apply {op} to {left}"),
    }
}

impl ErrorKind {
    /// Returns true for both flavours of type mismatch.
    #[must_use]
    pub const fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::InvalidOperand { .. })
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Rule that was being evaluated or fired.
    pub rule: Option<String>,
    /// Identity path of the value node involved.
    pub path: Option<String>,
    /// Line and column in rule source.
    pub position: Option<(u32, u32)>,
    /// Call frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule name.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Sets the identity path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.position = Some((line, column));
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, " at {path}")?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " in rule {rule}")?;
        }
        if let Some((line, column)) = self.position {
            write!(f, " ({line}:{column})")?;
        }
        for frame in &self.stack {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

/// Result type alias using the Gavel error.
pub type Result<T> = std::result::Result<T, Error>;

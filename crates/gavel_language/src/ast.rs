//! Abstract syntax tree for rule definitions.
//!
//! Any producer can build these nodes (the bundled parser is one). Node ids
//! are left at [`AstId::UNASSIGNED`] until a knowledge base registers the
//! rule and numbers every node with [`RuleDecl::assign_ids`].

use std::fmt;

use gavel_foundation::Value;

use crate::span::Span;

/// Identifier of an expression node within a knowledge base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AstId(pub u32);

impl AstId {
    /// Placeholder for nodes not yet registered.
    pub const UNASSIGNED: Self = Self(0);
}

impl fmt::Display for AstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Node id, assigned at registration.
    pub id: AstId,
    /// Source location (default for synthesized nodes).
    pub span: Span,
    /// What this node computes.
    pub kind: ExprKind,
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A constant.
    Literal(Value),
    /// A name bound in the data context, such as `TestCar`.
    Variable(String),
    /// Field access, `object.field`.
    Member {
        /// The record being accessed.
        object: Box<Expr>,
        /// Field name.
        field: String,
    },
    /// Array or map access, `object[index]`.
    Index {
        /// The collection.
        object: Box<Expr>,
        /// Position or key.
        index: Box<Expr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Free function call, `Now()`.
    Call {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Method call on a value, `Person.Name.ToUpper()`.
    MethodCall {
        /// The receiver.
        receiver: Box<Expr>,
        /// Method name.
        method: String,
        /// Arguments.
        args: Vec<Expr>,
    },
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

impl UnaryOp {
    /// Source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

/// Infix operators, lowest precedence first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Returns true for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Expr {
    /// Creates a node with an unassigned id.
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            id: AstId::UNASSIGNED,
            span,
            kind,
        }
    }

    /// A constant.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(ExprKind::Literal(value.into()), Span::default())
    }

    /// A data-context variable.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Variable(name.into()), Span::default())
    }

    /// `self.field`.
    #[must_use]
    pub fn member(self, field: impl Into<String>) -> Self {
        let span = self.span;
        Self::new(
            ExprKind::Member {
                object: Box::new(self),
                field: field.into(),
            },
            span,
        )
    }

    /// `self[index]`.
    #[must_use]
    pub fn index(self, index: Expr) -> Self {
        let span = self.span.merge(index.span);
        Self::new(
            ExprKind::Index {
                object: Box::new(self),
                index: Box::new(index),
            },
            span,
        )
    }

    /// `op self`.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let span = operand.span;
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// `left op right`.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span.merge(right.span);
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// `name(args)`.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.into(),
                args,
            },
            Span::default(),
        )
    }

    /// `self.method(args)`.
    #[must_use]
    pub fn method_call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        let span = self.span;
        Self::new(
            ExprKind::MethodCall {
                receiver: Box::new(self),
                method: method.into(),
                args,
            },
            span,
        )
    }

    /// Attaches a source span.
    #[must_use]
    pub const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The static variable path, such as `TestCar.Speed` or
    /// `Person.Children["Christen"]`.
    ///
    /// `None` unless this is a chain of variable, member and constant-index
    /// nodes.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Variable(name) => Some(name.clone()),
            ExprKind::Member { object, field } => {
                object.path().map(|base| format!("{base}.{field}"))
            }
            ExprKind::Index { object, index } => match &index.kind {
                ExprKind::Literal(Value::Int(n)) if *n >= 0 => {
                    object.path().map(|base| format!("{base}[{n}]"))
                }
                ExprKind::Literal(key @ Value::String(_)) => {
                    object.path().map(|base| format!("{base}[{key:?}]"))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns true if this is a constant.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    /// Returns true for function and method calls.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. } | ExprKind::MethodCall { .. })
    }

    fn assign_ids(&mut self, next: &mut u32) {
        *next += 1;
        self.id = AstId(*next);
        match &mut self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => {}
            ExprKind::Member { object, .. } => object.assign_ids(next),
            ExprKind::Index { object, index } => {
                object.assign_ids(next);
                index.assign_ids(next);
            }
            ExprKind::Unary { operand, .. } => operand.assign_ids(next),
            ExprKind::Binary { left, right, .. } => {
                left.assign_ids(next);
                right.assign_ids(next);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.assign_ids(next);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                receiver.assign_ids(next);
                for arg in args {
                    arg.assign_ids(next);
                }
            }
        }
    }
}

/// Assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

impl AssignOp {
    /// Source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
        }
    }

    /// The arithmetic a compound operator applies before storing.
    #[must_use]
    pub const fn binary(self) -> Option<BinaryOp> {
        match self {
            Self::Set => None,
            Self::Add => Some(BinaryOp::Add),
            Self::Sub => Some(BinaryOp::Sub),
            Self::Mul => Some(BinaryOp::Mul),
            Self::Div => Some(BinaryOp::Div),
        }
    }
}

/// `target op value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// A variable path (member or index chain).
    pub target: Expr,
    /// Operator.
    pub op: AssignOp,
    /// Right-hand side.
    pub value: Expr,
}

/// One action in a `then` block.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// Writes a fact field, element or entry.
    Assignment(Assignment),
    /// A function or method call evaluated for its effect.
    Expression(Expr),
    /// `Retract("RuleName")`.
    Retract {
        /// Rule to retract.
        rule: String,
        /// Source location.
        span: Span,
    },
}

impl Statement {
    /// Source location of this statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Assignment(assignment) => assignment.target.span.merge(assignment.value.span),
            Self::Expression(expr) => expr.span,
            Self::Retract { span, .. } => *span,
        }
    }
}

/// A complete rule.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleDecl {
    /// Unique name within a knowledge base.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Priority; higher fires first.
    pub salience: i32,
    /// Condition; must evaluate to a boolean.
    pub when: Expr,
    /// Actions, executed in order.
    pub then: Vec<Statement>,
    /// Source location of the whole rule.
    pub span: Span,
}

impl RuleDecl {
    /// Creates a rule with no description and salience 0.
    #[must_use]
    pub fn new(name: impl Into<String>, when: Expr, then: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            salience: 0,
            when,
            then,
            span: Span::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the salience.
    #[must_use]
    pub const fn with_salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Numbers every expression node, continuing from `next`.
    ///
    /// Returns the last id used.
    pub fn assign_ids(&mut self, mut next: u32) -> u32 {
        self.when.assign_ids(&mut next);
        for statement in &mut self.then {
            match statement {
                Statement::Assignment(assignment) => {
                    assignment.target.assign_ids(&mut next);
                    assignment.value.assign_ids(&mut next);
                }
                Statement::Expression(expr) => expr.assign_ids(&mut next),
                Statement::Retract { .. } => {}
            }
        }
        next
    }
}

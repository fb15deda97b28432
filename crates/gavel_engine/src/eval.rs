//! Tree-walking evaluation of conditions and actions.
//!
//! Variable references resolve to [`ValueNode`]s in a per-evaluation
//! [`NodeArena`]; the live value is read only when an operator needs it.
//! Every fact read is recorded in working memory under its identity path,
//! and every assignment records a write.

use std::cmp::Ordering;

use gavel_foundation::{Error, ErrorContext, ErrorKind, Result, Type, Value};
use gavel_language::{Assignment, BinaryOp, Expr, ExprKind, Span, Statement, UnaryOp};
use gavel_model::{NodeArena, ValueNode};

use crate::builtins::{CallEnv, FunctionProvider};
use crate::context::DataContext;
use crate::knowledge::KnowledgeBase;

/// Evaluates expressions and executes statements against a data context.
pub struct Evaluator<'a> {
    context: &'a DataContext,
    arena: &'a NodeArena,
    knowledge: &'a mut KnowledgeBase,
    builtins: &'a dyn FunctionProvider,
    rule: Option<&'a str>,
    reads: Vec<(String, u64)>,
    cacheable: bool,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator. `builtins` is consulted for bare calls the
    /// context's own provider does not answer.
    pub fn new(
        context: &'a DataContext,
        arena: &'a NodeArena,
        knowledge: &'a mut KnowledgeBase,
        builtins: &'a dyn FunctionProvider,
    ) -> Self {
        knowledge.memory_mut().set_aliases(context.aliases());
        Self {
            context,
            arena,
            knowledge,
            builtins,
            rule: None,
            reads: Vec::new(),
            cacheable: true,
        }
    }

    /// Names the rule being evaluated, for natives and log output.
    #[must_use]
    pub fn in_rule(mut self, rule: &'a str) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Fact reads made so far, as `(path, fingerprint)` pairs.
    pub fn take_reads(&mut self) -> Vec<(String, u64)> {
        std::mem::take(&mut self.reads)
    }

    /// False once a read could not be fingerprinted, so the reads taken do
    /// not fully describe what the result depended on.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    /// Evaluates an expression.
    ///
    /// # Errors
    ///
    /// Navigation, type, arithmetic and call errors, with the source position
    /// of the innermost failing expression.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.eval(expr).map_err(|err| at_span(err, expr.span))
    }

    /// Executes one action.
    ///
    /// # Errors
    ///
    /// As for [`Evaluator::evaluate`]; a failed assignment leaves the target
    /// unchanged.
    pub fn execute(&mut self, statement: &Statement) -> Result<()> {
        let result = match statement {
            Statement::Assignment(assignment) => self.assign(assignment),
            Statement::Expression(expr) => self.evaluate(expr).map(drop),
            Statement::Retract { rule, .. } => self.knowledge.retract(rule),
        };
        result.map_err(|err| at_span(err, statement.span()))
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Variable(_) | ExprKind::Member { .. } | ExprKind::Index { .. } => {
                let node = self.resolve(expr)?;
                let value = node.get_value()?;
                if is_fact_path(expr) {
                    self.observe(node.identified_as(), &value);
                }
                Ok(value)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                unary(*op, &value)
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right),
            ExprKind::Call { name, args } => {
                let args = self.arguments(args)?;
                self.call(name, &args)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let node = if is_place(receiver) {
                    self.resolve(receiver)?
                } else {
                    let value = self.evaluate(receiver)?;
                    self.arena.constant(value)
                };
                let args = self.arguments(args)?;
                node.call_function(method, &args)
            }
        }
    }

    fn arguments(&mut self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    /// Resolves a place expression to a node without reading it.
    fn resolve(&mut self, expr: &Expr) -> Result<ValueNode<'a>> {
        let arena: &'a NodeArena = self.arena;
        match &expr.kind {
            ExprKind::Variable(name) => {
                let handle = self.context.fact(name)?;
                Ok(arena.root(name, handle))
            }
            ExprKind::Member { object, field } => self.resolve(object)?.get_child_node_by_field(field),
            ExprKind::Index { object, index } => {
                let parent = self.resolve(object)?;
                let key = self.evaluate(index)?;
                if parent.is_map() {
                    parent.get_child_node_by_selector(key)
                } else {
                    parent.get_child_node_by_index(array_index(&key)?)
                }
            }
            _ => {
                let value = self.evaluate(expr)?;
                Ok(arena.constant(value))
            }
        }
    }

    fn observe(&mut self, path: String, value: &Value) {
        self.knowledge.memory_mut().observe(&path, value);
        self.reads.push((path, value.fingerprint()));
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let lhs = self.evaluate(left)?;
                let lhs = lhs
                    .as_bool()
                    .ok_or_else(|| Error::invalid_operand(op.symbol(), lhs.type_of(), None))?;
                if lhs == (op == BinaryOp::Or) {
                    return Ok(Value::Bool(lhs));
                }
                let rhs = self.evaluate(right)?;
                rhs.as_bool().map(Value::Bool).ok_or_else(|| {
                    Error::invalid_operand(op.symbol(), Type::Bool, Some(rhs.type_of()))
                })
            }
            BinaryOp::Eq | BinaryOp::NotEq if is_nil_literal(right) && is_place(left) => {
                self.nil_check(op, left)
            }
            BinaryOp::Eq | BinaryOp::NotEq if is_nil_literal(left) && is_place(right) => {
                self.nil_check(op, right)
            }
            _ => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                apply_binary(op, &lhs, &rhs)
            }
        }
    }

    /// `place == nil` tests the slot itself, so records and maps can be
    /// compared against nil without a scalar snapshot.
    fn nil_check(&mut self, op: BinaryOp, place: &Expr) -> Result<Value> {
        let node = self.resolve(place)?;
        node.kind()?;
        let nil = node.is_nil();
        if is_fact_path(place) {
            match node.get_value() {
                Ok(value) => self.observe(node.identified_as(), &value),
                Err(_) => self.cacheable = false,
            }
        }
        Ok(Value::Bool(nil == (op == BinaryOp::Eq)))
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let context: &'a DataContext = self.context;
        let builtins: &'a dyn FunctionProvider = self.builtins;
        let native = context
            .functions()
            .and_then(|provider| provider.function(name))
            .or_else(|| builtins.function(name));
        if let Some(function) = native {
            let mut env = CallEnv::new(&mut *self.knowledge, self.rule);
            return function.call(args, &mut env);
        }

        if let Ok(handle) = context.fact(name) {
            let node = self.arena.root(name, handle);
            if node.is_function() {
                return node.invoke(args).map_err(|err| err.with_frame(name));
            }
        }
        Err(Error::new(ErrorKind::UndefinedFunction(name.to_string())))
    }

    fn assign(&mut self, assignment: &Assignment) -> Result<()> {
        let Assignment { target, op, value } = assignment;
        let value = match op.binary() {
            Some(binary) => {
                let current = self.evaluate(target)?;
                let operand = self.evaluate(value)?;
                apply_binary(binary, &current, &operand)?
            }
            None => self.evaluate(value)?,
        };

        let path = match &target.kind {
            ExprKind::Member { object, field } => {
                let parent = self.resolve(object)?;
                parent.set_object_value_by_field(field, &value)?;
                format!("{}.{field}", parent.identified_as())
            }
            ExprKind::Index { object, index } => {
                let parent = self.resolve(object)?;
                let key = self.evaluate(index)?;
                if parent.is_map() {
                    parent.set_map_value_at(&key, &value)?;
                    format!("{}[{key:?}]", parent.identified_as())
                } else {
                    let position = array_index(&key)?;
                    parent.set_array_value_at(position, &value)?;
                    format!("{}[{position}]", parent.identified_as())
                }
            }
            _ => return Err(Error::not_applicable("assignment", "expression")),
        };

        if is_fact_path(target) {
            self.knowledge.memory_mut().record_write(&path, &value);
        }
        Ok(())
    }
}

fn at_span(mut err: Error, span: Span) -> Error {
    let context = err.context.get_or_insert_with(ErrorContext::new);
    if context.position.is_none() {
        context.position = Some((span.line, span.column));
    }
    err
}

const fn is_place(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Variable(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
    )
}

fn is_nil_literal(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Literal(Value::Nil))
}

/// True if the place is rooted in a bound fact rather than a computed value.
fn is_fact_path(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Variable(_) => true,
        ExprKind::Member { object, .. } | ExprKind::Index { object, .. } => is_fact_path(object),
        _ => false,
    }
}

fn array_index(key: &Value) -> Result<usize> {
    match key {
        Value::Int(n) => {
            usize::try_from(*n).map_err(|_| Error::not_applicable("negative index", n.to_string()))
        }
        other => Err(Error::type_mismatch(Type::Int, other.type_of())),
    }
}

/// Orders two numbers, promoting to float unless both are ints.
pub(crate) fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => left.as_number()?.partial_cmp(&right.as_number()?),
    }
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| Error::new(ErrorKind::Overflow(format!("-{n}")))),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        _ => Err(Error::invalid_operand(op.symbol(), value.type_of(), None)),
    }
}

/// Applies a binary operator to two evaluated operands.
pub(crate) fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = equals(op, left, right)?;
            Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => ordering(op, left, right),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(invalid(op, left, right)),
        },
    }
}

fn invalid(op: BinaryOp, left: &Value, right: &Value) -> Error {
    Error::invalid_operand(op.symbol(), left.type_of(), Some(right.type_of()))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return integer_arithmetic(op, *a, *b);
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return float_arithmetic(op, a, b);
    }
    let text = |v: &Value| {
        matches!(
            v,
            Value::String(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Time(_)
        )
    };
    let has_string = matches!(left, Value::String(_)) || matches!(right, Value::String(_));
    if op == BinaryOp::Add && has_string && text(left) && text(right) {
        return Ok(Value::from(format!("{left}{right}")));
    }
    Err(invalid(op, left, right))
}

fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(Error::new(ErrorKind::DivisionByZero));
        }
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        _ => return Err(Error::invalid_operand(op.symbol(), Type::Int, Some(Type::Int))),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| Error::new(ErrorKind::Overflow(format!("{a} {op} {b}"))))
}

#[allow(clippy::float_cmp)]
fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
            return Err(Error::new(ErrorKind::DivisionByZero));
        }
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        _ => return Err(Error::invalid_operand(op.symbol(), Type::Float, Some(Type::Float))),
    };
    Ok(Value::Float(result))
}

fn equals(op: BinaryOp, left: &Value, right: &Value) -> Result<bool> {
    match (left, right) {
        (Value::Nil, other) | (other, Value::Nil) => Ok(other.is_nil()),
        _ if left.is_numeric() && right.is_numeric() => {
            Ok(compare_numbers(left, right) == Some(Ordering::Equal))
        }
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => Ok(left == right),
        _ => Err(invalid(op, left, right)),
    }
}

fn ordering(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        _ if left.is_numeric() && right.is_numeric() => compare_numbers(left, right),
        _ => return Err(invalid(op, left, right)),
    };
    let holds = ordering.is_some_and(|ordering| match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    });
    Ok(Value::Bool(holds))
}

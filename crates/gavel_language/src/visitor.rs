//! Read-only traversal of rule syntax trees.
//!
//! Working memory builds its variable index with these walkers, and hosts can
//! implement [`ExprVisitor`] for their own lint or analysis passes.
//!
//! # Example
//!
//! ```
//! use gavel_language::parse_expression;
//! use gavel_language::visitor::{ExprVisitor, walk_expr};
//!
//! struct CallCounter(usize);
//!
//! impl ExprVisitor for CallCounter {
//!     fn visit_call(&mut self, _name: &str, _args: &[gavel_language::Expr]) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let expr = parse_expression("Max(Abs(A.X), 3) > Now().Year()").unwrap();
//! let mut counter = CallCounter(0);
//! walk_expr(&mut counter, &expr);
//! assert_eq!(counter.0, 4);
//! ```

use std::collections::BTreeSet;

use gavel_foundation::Value;

use crate::ast::{AstId, Expr, ExprKind, RuleDecl, Statement};
use crate::span::Span;

/// Trait for read-only expression visitors.
///
/// The default implementations do nothing. Use [`walk_expr`],
/// [`walk_statement`] or [`walk_rule`] to drive a traversal.
#[allow(unused_variables)]
pub trait ExprVisitor {
    /// Called before any expression node's children.
    fn enter_expr(&mut self, expr: &Expr) {}

    /// Called after an expression node's children.
    fn leave_expr(&mut self, expr: &Expr) {}

    /// Visit a constant.
    fn visit_literal(&mut self, value: &Value, span: Span) {}

    /// Visit a data-context variable.
    fn visit_variable(&mut self, name: &str, span: Span) {}

    /// Visit a function call, before its arguments.
    ///
    /// Calls counted here include both free and method calls.
    fn visit_call(&mut self, name: &str, args: &[Expr]) {}

    /// Called before the actions of a statement are walked.
    fn enter_statement(&mut self, statement: &Statement) {}

    /// Visit an assignment target, before the target expression is walked.
    fn visit_assignment_target(&mut self, target: &Expr) {}

    /// Visit a literal retraction.
    fn visit_retract(&mut self, rule: &str, span: Span) {}
}

/// Walk an expression depth-first.
pub fn walk_expr<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    visitor.enter_expr(expr);

    match &expr.kind {
        ExprKind::Literal(value) => visitor.visit_literal(value, expr.span),
        ExprKind::Variable(name) => visitor.visit_variable(name, expr.span),
        ExprKind::Member { object, .. } => walk_expr(visitor, object),
        ExprKind::Index { object, index } => {
            walk_expr(visitor, object);
            walk_expr(visitor, index);
        }
        ExprKind::Unary { operand, .. } => walk_expr(visitor, operand),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        ExprKind::Call { name, args } => {
            visitor.visit_call(name, args);
            for arg in args {
                walk_expr(visitor, arg);
            }
        }
        ExprKind::MethodCall {
            receiver,
            method,
            args,
        } => {
            walk_expr(visitor, receiver);
            visitor.visit_call(method, args);
            for arg in args {
                walk_expr(visitor, arg);
            }
        }
    }

    visitor.leave_expr(expr);
}

/// Walk one action.
pub fn walk_statement<V: ExprVisitor + ?Sized>(visitor: &mut V, statement: &Statement) {
    visitor.enter_statement(statement);
    match statement {
        Statement::Assignment(assignment) => {
            visitor.visit_assignment_target(&assignment.target);
            walk_expr(visitor, &assignment.target);
            walk_expr(visitor, &assignment.value);
        }
        Statement::Expression(expr) => walk_expr(visitor, expr),
        Statement::Retract { rule, span } => visitor.visit_retract(rule, *span),
    }
}

/// Walk a rule's condition, then its actions in order.
pub fn walk_rule<V: ExprVisitor + ?Sized>(visitor: &mut V, rule: &RuleDecl) {
    walk_expr(visitor, &rule.when);
    for statement in &rule.then {
        walk_statement(visitor, statement);
    }
}

/// Collects every node that names a static variable path.
#[derive(Debug, Default)]
pub struct PathCollector {
    /// `(path, node)` pairs in visit order.
    pub paths: Vec<(String, AstId)>,
}

impl ExprVisitor for PathCollector {
    fn enter_expr(&mut self, expr: &Expr) {
        if let Some(path) = expr.path() {
            self.paths.push((path, expr.id));
        }
    }
}

/// Collects the static paths of assignment targets.
#[derive(Debug, Default)]
pub struct WriteCollector {
    /// Target paths, deduplicated.
    pub targets: BTreeSet<String>,
    /// True if some target has a computed index.
    pub dynamic: bool,
}

impl ExprVisitor for WriteCollector {
    fn visit_assignment_target(&mut self, target: &Expr) {
        match target.path() {
            Some(path) => {
                self.targets.insert(path);
            }
            None => self.dynamic = true,
        }
    }
}

#[derive(Default)]
struct CallDetector(bool);

impl ExprVisitor for CallDetector {
    fn visit_call(&mut self, _name: &str, _args: &[Expr]) {
        self.0 = true;
    }
}

/// Every static variable path read by an expression, with the nodes that
/// name it. Prefixes are included: `A.B.C` also yields `A.B` and `A`.
#[must_use]
pub fn collect_paths(expr: &Expr) -> Vec<(String, AstId)> {
    let mut collector = PathCollector::default();
    walk_expr(&mut collector, expr);
    collector.paths
}

/// Returns true if evaluating the expression calls any function or method.
#[must_use]
pub fn contains_calls(expr: &Expr) -> bool {
    let mut detector = CallDetector::default();
    walk_expr(&mut detector, expr);
    detector.0
}

/// Static paths the actions of a rule assign to.
#[must_use]
pub fn assignment_targets(rule: &RuleDecl) -> WriteCollector {
    let mut collector = WriteCollector::default();
    for statement in &rule.then {
        walk_statement(&mut collector, statement);
    }
    collector
}

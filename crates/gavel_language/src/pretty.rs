//! Pretty-printer for rule declarations.
//!
//! Output is deterministic and parses back to an equivalent rule. Every
//! binary expression is parenthesized, so the printed form never depends on
//! precedence.
//!
//! # Example
//!
//! ```
//! use gavel_language::{parse, pretty::pretty_print_expr};
//!
//! let rules = parse("rule A { when X.Speed < 3 + 4 * 2 then Log(\"go\"); }").unwrap();
//! assert_eq!(pretty_print_expr(&rules[0].when), "(X.Speed < (3 + (4 * 2)))");
//! ```

use std::fmt::Write;

use gavel_foundation::Value;

use crate::ast::{Assignment, Expr, ExprKind, RuleDecl, Statement};

/// Configuration for pretty-printing.
#[derive(Debug, Clone)]
pub struct PrettyConfig {
    /// Number of spaces for each indentation level.
    pub indent_width: usize,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// Pretty-print a rule.
#[must_use]
pub fn pretty_print_rule(rule: &RuleDecl) -> String {
    pretty_print_rule_with_config(rule, &PrettyConfig::default())
}

/// Pretty-print a rule with custom configuration.
#[must_use]
pub fn pretty_print_rule_with_config(rule: &RuleDecl, config: &PrettyConfig) -> String {
    let mut printer = PrettyPrinter::new(config.clone());
    printer.print_rule(rule);
    printer.output
}

/// Pretty-print several rules separated by blank lines.
#[must_use]
pub fn pretty_print_rules(rules: &[RuleDecl]) -> String {
    rules
        .iter()
        .map(pretty_print_rule)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-print a single expression.
#[must_use]
pub fn pretty_print_expr(expr: &Expr) -> String {
    let mut printer = PrettyPrinter::new(PrettyConfig::default());
    printer.print_expr(expr);
    printer.output
}

/// Pretty-print a single statement, without the trailing `;`.
#[must_use]
pub fn pretty_print_statement(statement: &Statement) -> String {
    let mut printer = PrettyPrinter::new(PrettyConfig::default());
    printer.print_statement(statement);
    printer.output
}

/// Pretty-printer state.
struct PrettyPrinter {
    config: PrettyConfig,
    output: String,
    indent_level: usize,
}

impl PrettyPrinter {
    fn new(config: PrettyConfig) -> Self {
        Self {
            config,
            output: String::new(),
            indent_level: 0,
        }
    }

    fn print_rule(&mut self, rule: &RuleDecl) {
        self.output.push_str("rule ");
        self.output.push_str(&rule.name);
        if !rule.description.is_empty() {
            self.output.push(' ');
            self.print_string(&rule.description);
        }
        if rule.salience != 0 {
            let _ = write!(self.output, " salience {}", rule.salience);
        }
        self.output.push_str(" {\n");

        self.indent_level += 1;
        self.line("when");
        self.indent_level += 1;
        self.push_indent();
        self.print_expr(&rule.when);
        self.output.push('\n');
        self.indent_level -= 1;

        self.line("then");
        self.indent_level += 1;
        for statement in &rule.then {
            self.push_indent();
            self.print_statement(statement);
            self.output.push_str(";\n");
        }
        self.indent_level = 0;
        self.output.push_str("}\n");
    }

    fn print_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Assignment(Assignment { target, op, value }) => {
                self.print_expr(target);
                let _ = write!(self.output, " {} ", op.symbol());
                self.print_expr(value);
            }
            Statement::Expression(expr) => self.print_expr(expr),
            Statement::Retract { rule, .. } => {
                self.output.push_str("Retract(");
                self.print_string(rule);
                self.output.push(')');
            }
        }
    }

    fn print_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(value) => self.print_value(value),
            ExprKind::Variable(name) => self.output.push_str(name),
            ExprKind::Member { object, field } => {
                self.print_expr(object);
                self.output.push('.');
                self.output.push_str(field);
            }
            ExprKind::Index { object, index } => {
                self.print_expr(object);
                self.output.push('[');
                self.print_expr(index);
                self.output.push(']');
            }
            ExprKind::Unary { op, operand } => {
                self.output.push_str(op.symbol());
                self.print_expr(operand);
            }
            ExprKind::Binary { op, left, right } => {
                self.output.push('(');
                self.print_expr(left);
                let _ = write!(self.output, " {} ", op.symbol());
                self.print_expr(right);
                self.output.push(')');
            }
            ExprKind::Call { name, args } => {
                self.output.push_str(name);
                self.print_args(args);
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                self.print_expr(receiver);
                self.output.push('.');
                self.output.push_str(method);
                self.print_args(args);
            }
        }
    }

    fn print_args(&mut self, args: &[Expr]) {
        self.output.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.print_expr(arg);
        }
        self.output.push(')');
    }

    fn print_value(&mut self, value: &Value) {
        match value {
            Value::Float(n) => self.print_float(*n),
            Value::String(s) => self.print_string(s),
            Value::Time(t) => self.print_string(&t.to_rfc3339()),
            Value::Array(items) => {
                self.output.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.print_value(item);
                }
                self.output.push(']');
            }
            other => {
                let _ = write!(self.output, "{other}");
            }
        }
    }

    fn print_float(&mut self, n: f64) {
        let s = format!("{n:?}");
        self.output.push_str(&s);
        if !s.contains('.') && !s.contains('e') && !s.contains("inf") && !s.contains("NaN") {
            self.output.push_str(".0");
        }
    }

    fn print_string(&mut self, s: &str) {
        self.output.push('"');
        for c in s.chars() {
            match c {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\r' => self.output.push_str("\\r"),
                '\t' => self.output.push_str("\\t"),
                '\u{8}' => self.output.push_str("\\b"),
                '\u{c}' => self.output.push_str("\\f"),
                c if c.is_control() => {
                    let _ = write!(self.output, "\\u{:04X}", c as u32);
                }
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn line(&mut self, text: &str) {
        self.push_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn push_indent(&mut self) {
        let width = self.indent_level * self.config.indent_width;
        self.output.extend(std::iter::repeat_n(' ', width));
    }
}

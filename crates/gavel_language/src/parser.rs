//! Parser for the rule language.
//!
//! The parser converts a stream of tokens into [`RuleDecl`] values:
//!
//! ```text
//! rule Name "description" salience 10 {
//!     when <expr>
//!     then <statement>; <statement>; ...
//! }
//! ```
//!
//! Expression precedence, loosest first: `||`, `&&`, comparisons,
//! `+ -`, `* / %`, prefix `! -`, then postfix `.field`, `.Method(...)`
//! and `[index]`.

use gavel_foundation::{Error, Result, Value};

use crate::ast::{AssignOp, Assignment, BinaryOp, Expr, ExprKind, RuleDecl, Statement, UnaryOp};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for rule source.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Span of the last consumed token.
    previous: Span,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Span::default(),
        }
    }

    /// Parses every rule in the source.
    ///
    /// # Errors
    /// Returns a `LexicalError` for malformed tokens and a `SyntaxError` for
    /// malformed structure. Nothing is returned on failure.
    pub fn parse_all(&mut self) -> Result<Vec<RuleDecl>> {
        self.skip_trivia()?;
        let mut rules = Vec::new();
        while self.current.kind != TokenKind::Eof {
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    /// Parses a single expression spanning the whole source.
    ///
    /// # Errors
    /// Returns an error if the source is not exactly one expression.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.skip_trivia()?;
        let expr = self.parse_or()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    fn parse_rule(&mut self) -> Result<RuleDecl> {
        let start = self.current.span;
        self.expect(&TokenKind::Rule)?;

        let name = match &self.current.kind {
            TokenKind::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("rule name")),
        };
        self.advance()?;

        let description = match &self.current.kind {
            TokenKind::String(text) => {
                let text = text.clone();
                self.advance()?;
                text
            }
            _ => String::new(),
        };

        let salience = if self.current.kind == TokenKind::Salience {
            self.advance()?;
            self.parse_salience()?
        } else {
            0
        };

        self.expect(&TokenKind::LBrace)?;
        self.expect(&TokenKind::When)?;
        let when = self.parse_or()?;
        self.expect(&TokenKind::Then)?;

        let mut then = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            then.push(self.parse_statement()?);
            self.expect(&TokenKind::Semicolon)?;
        }
        if then.is_empty() {
            return Err(self.error("rule has no actions"));
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(RuleDecl {
            name,
            description,
            salience,
            when,
            then,
            span: start.merge(self.previous),
        })
    }

    fn parse_salience(&mut self) -> Result<i32> {
        let negative = self.current.kind == TokenKind::Minus;
        if negative {
            self.advance()?;
        }
        let TokenKind::Int(n) = self.current.kind else {
            return Err(self.unexpected("integer salience"));
        };
        let n = if negative { -n } else { n };
        let salience = i32::try_from(n).map_err(|_| self.error("salience out of range"))?;
        self.advance()?;
        Ok(salience)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let target = self.parse_or()?;

        if let Some(op) = assign_op(&self.current.kind) {
            if !matches!(
                target.kind,
                ExprKind::Member { .. } | ExprKind::Index { .. }
            ) {
                return Err(error_at(target.span, "invalid assignment target"));
            }
            self.advance()?;
            let value = self.parse_or()?;
            return Ok(Statement::Assignment(Assignment { target, op, value }));
        }

        if let ExprKind::Call { name, args } = &target.kind {
            if name == "Retract" {
                if let [Expr {
                    kind: ExprKind::Literal(Value::String(rule)),
                    ..
                }] = args.as_slice()
                {
                    return Ok(Statement::Retract {
                        rule: rule.to_string(),
                        span: target.span,
                    });
                }
            }
        }

        if !target.is_call() {
            return Err(error_at(target.span, "expected an assignment or a call"));
        }
        Ok(Statement::Expression(target))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.current.kind == TokenKind::OrOr {
            self.advance()?;
            let right = self.parse_and()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.current.kind == TokenKind::AndAnd {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.current.span;
        let op = match self.current.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);

        // Negative number literals fold into constants.
        if op == UnaryOp::Neg {
            match &operand.kind {
                ExprKind::Literal(Value::Int(n)) => {
                    if let Some(negated) = n.checked_neg() {
                        return Ok(Expr::literal(negated).with_span(span));
                    }
                }
                ExprKind::Literal(Value::Float(n)) => {
                    return Ok(Expr::literal(-n).with_span(span));
                }
                _ => {}
            }
        }
        Ok(Expr::unary(op, operand).with_span(span))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let TokenKind::Ident(name) = &self.current.kind else {
                        return Err(self.unexpected("field or method name"));
                    };
                    let name = name.clone();
                    self.advance()?;
                    if self.current.kind == TokenKind::LParen {
                        let args = self.parse_arguments()?;
                        let span = expr.span.merge(self.previous);
                        expr = expr.method_call(name, args).with_span(span);
                    } else {
                        let span = expr.span.merge(self.previous);
                        expr = expr.member(name).with_span(span);
                    }
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let index = self.parse_or()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous);
                    expr = expr.index(index).with_span(span);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current.span;
        let literal = match &self.current.kind {
            TokenKind::Nil => Value::Nil,
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Int(n) => Value::Int(*n),
            TokenKind::Float(n) => Value::Float(*n),
            TokenKind::String(s) => Value::from(s.as_str()),
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                if self.current.kind == TokenKind::LParen {
                    let args = self.parse_arguments()?;
                    return Ok(Expr::call(name, args).with_span(span.merge(self.previous)));
                }
                return Ok(Expr::variable(name).with_span(span));
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner.with_span(span.merge(self.previous)));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance()?;
        Ok(Expr::literal(literal).with_span(span))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current.kind == TokenKind::RParen {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.current.kind {
                TokenKind::Comma => self.advance()?,
                TokenKind::RParen => {
                    self.advance()?;
                    return Ok(args);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    /// Skips comment tokens, surfacing malformed ones.
    fn skip_trivia(&mut self) -> Result<()> {
        while self.current.kind.is_trivia() {
            self.current = self.lexer.next_token();
        }
        if let TokenKind::Error(message) = &self.current.kind {
            let span = self.current.span;
            return Err(Error::lexical(message.clone(), span.line, span.column));
        }
        Ok(())
    }

    /// Advances to the next significant token.
    fn advance(&mut self) -> Result<()> {
        self.previous = self.current.span;
        self.current = self.lexer.next_token();
        self.skip_trivia()
    }

    /// Expects the current token to be of a specific kind, then advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        let matches =
            std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected);
        if matches {
            self.advance()
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error(&format!(
            "expected {expected}, found {}",
            self.current.kind.name()
        ))
    }

    /// Creates a syntax error at the current position.
    fn error(&self, message: &str) -> Error {
        error_at(self.current.span, message)
    }
}

fn error_at(span: Span, message: &str) -> Error {
    Error::syntax(message, span.line, span.column)
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Assign => Some(AssignOp::Set),
        TokenKind::PlusAssign => Some(AssignOp::Add),
        TokenKind::MinusAssign => Some(AssignOp::Sub),
        TokenKind::StarAssign => Some(AssignOp::Mul),
        TokenKind::SlashAssign => Some(AssignOp::Div),
        _ => None,
    }
}

/// Parses rule source into rule declarations.
///
/// # Errors
/// Returns an error if the source cannot be parsed.
pub fn parse(source: &str) -> Result<Vec<RuleDecl>> {
    Parser::new(source).parse_all()
}

/// Parses a single expression.
///
/// # Errors
/// Returns an error if the source is not exactly one expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    Parser::new(source).parse_expression()
}

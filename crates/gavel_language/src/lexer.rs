//! Lexer for the rule language.
//!
//! Malformed input never panics: it becomes a [`TokenKind::Error`] token
//! which the parser turns into a `LexicalError`. String escapes are checked
//! here, so a rule base with `"abc\cde"` in it fails to build.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Converts rule source into tokens.
pub struct Lexer<'src> {
    /// Full source text.
    source: &'src str,
    /// Unscanned remainder of the source.
    rest: &'src str,
    /// Byte offset of `rest` in `source`.
    position: usize,
    /// Current line (1-based).
    line: u32,
    /// Current column (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer over `source`.
    #[must_use]
    pub const fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Scans the next token. Returns [`TokenKind::Eof`] forever once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, Span::point(start, start_line, start_column));
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '.' => self.single(TokenKind::Dot),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '%' => self.single(TokenKind::Percent),
            '+' => self.with_assign(TokenKind::Plus, TokenKind::PlusAssign),
            '-' => self.with_assign(TokenKind::Minus, TokenKind::MinusAssign),
            '*' => self.with_assign(TokenKind::Star, TokenKind::StarAssign),
            '/' => match self.peek_char_n(1) {
                Some('/') => self.scan_line_comment(),
                Some('*') => self.scan_block_comment(),
                _ => self.with_assign(TokenKind::Slash, TokenKind::SlashAssign),
            },
            '=' => self.with_assign(TokenKind::Assign, TokenKind::EqEq),
            '!' => self.with_assign(TokenKind::Bang, TokenKind::NotEq),
            '<' => self.with_assign(TokenKind::Lt, TokenKind::LtEq),
            '>' => self.with_assign(TokenKind::Gt, TokenKind::GtEq),
            '&' => self.doubled('&', TokenKind::AndAnd),
            '|' => self.doubled('|', TokenKind::OrOr),
            '"' | '\'' => self.scan_string(c),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Scans the whole source, including comments, ending with `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// `x` or `x=`.
    fn with_assign(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// `&&` and `||`; a lone `&` or `|` is an error.
    fn doubled(&mut self, c: char, kind: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(c) {
            self.advance();
            kind
        } else {
            TokenKind::Error(format!("expected {c}{c}"))
        }
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        let start = self.position;
        self.advance();
        self.advance();
        loop {
            match self.peek_char() {
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return TokenKind::Comment(self.source[start..self.position].to_string());
                }
                Some(_) => self.advance(),
                None => return TokenKind::Error("unterminated block comment".into()),
            }
        }
    }

    /// Scans a string delimited by `quote`, decoding escapes.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return TokenKind::String(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_escape() {
                        Ok(c) => text.push(c),
                        Err(message) => {
                            self.skip_rest_of_string(quote);
                            return TokenKind::Error(message);
                        }
                    }
                }
                None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }

    /// Decodes the escape after a backslash.
    fn scan_escape(&mut self) -> Result<char, String> {
        let Some(c) = self.peek_char() else {
            return Err("unexpected end of input in string escape".into());
        };
        let decoded = match c {
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.advance();
                return self.scan_unicode_escape();
            }
            other => return Err(format!("invalid escape sequence: \\{other}")),
        };
        self.advance();
        Ok(decoded)
    }

    /// Decodes the four hex digits of `\uXXXX`.
    fn scan_unicode_escape(&mut self) -> Result<char, String> {
        let digits: String = self.rest.chars().take(4).collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid unicode escape: \\u{digits}"));
        }
        for _ in 0..4 {
            self.advance();
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid unicode escape: \\u{digits}"))
    }

    fn skip_rest_of_string(&mut self, quote: char) {
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == quote {
                break;
            }
        }
    }

    /// Scans an integer or float literal. Signs are unary operators.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut is_float = false;

        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char_n(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text = &self.source[start..self.position];
        if is_float {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid float {text}: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(e) => TokenKind::Error(format!("invalid integer {text}: {e}")),
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        let word = &self.source[start..self.position];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

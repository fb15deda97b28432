//! Tokens of the rule language.

use crate::span::Span;

/// A token and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// Where it was scanned.
    pub span: Span,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the source text of this token.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Token types.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    /// `rule`
    Rule,
    /// `salience`
    Salience,
    /// `when`
    When,
    /// `then`
    Then,
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,

    // Literals
    /// Identifier such as `TestCar` or `Speed`
    Ident(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal with escapes already decoded
    String(String),

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `==`
    EqEq,
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
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,

    // Meta
    /// `// ...` or `/* ... */`
    Comment(String),
    /// End of input
    Eof,
    /// Malformed input; the message says why
    Error(String),
}

impl TokenKind {
    /// Returns true for tokens the parser skips.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Maps a word to its keyword token, if it is one.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "rule" => Self::Rule,
            "salience" => Self::Salience,
            "when" => Self::When,
            "then" => Self::Then,
            "true" => Self::True,
            "false" => Self::False,
            "nil" => Self::Nil,
            _ => return None,
        };
        Some(kind)
    }

    /// Human-readable name for error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rule => "'rule'",
            Self::Salience => "'salience'",
            Self::When => "'when'",
            Self::Then => "'then'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Nil => "'nil'",
            Self::Ident(_) => "identifier",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Bang => "'!'",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Lt => "'<'",
            Self::LtEq => "'<='",
            Self::Gt => "'>'",
            Self::GtEq => "'>='",
            Self::Assign => "'='",
            Self::PlusAssign => "'+='",
            Self::MinusAssign => "'-='",
            Self::StarAssign => "'*='",
            Self::SlashAssign => "'/='",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}

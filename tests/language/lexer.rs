//! Integration tests for the lexer

use gavel_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn rule_header() {
    assert_eq!(
        kinds(r#"rule SpeedUp "go" salience 10 {"#),
        [
            TokenKind::Rule,
            TokenKind::Ident("SpeedUp".into()),
            TokenKind::String("go".into()),
            TokenKind::Salience,
            TokenKind::Int(10),
            TokenKind::LBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operators() {
    assert_eq!(
        kinds("== != <= >= < > && || ! += -= *= /= = % ."),
        [
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Bang,
            TokenKind::PlusAssign,
            TokenKind::MinusAssign,
            TokenKind::StarAssign,
            TokenKind::SlashAssign,
            TokenKind::Assign,
            TokenKind::Percent,
            TokenKind::Dot,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numbers() {
    assert_eq!(
        kinds("42 3.25"),
        [TokenKind::Int(42), TokenKind::Float(3.25), TokenKind::Eof]
    );
}

#[test]
fn both_quote_styles() {
    assert_eq!(
        kinds(r#""double" 'single'"#),
        [
            TokenKind::String("double".into()),
            TokenKind::String("single".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn escapes() {
    assert_eq!(
        kinds(r#""a\\c\n\"q\"""#),
        [TokenKind::String("a\\c\n\"q\"".into()), TokenKind::Eof]
    );
    let tokens = kinds(r#""abc\cde""#);
    assert!(matches!(&tokens[0], TokenKind::Error(message) if message.contains("\\c")));
}

#[test]
fn comments_are_tokens() {
    let tokens = kinds("x // note\ny");
    assert!(matches!(&tokens[1], TokenKind::Comment(_)));
    assert_eq!(tokens[2], TokenKind::Ident("y".into()));
}

#[test]
fn keywords_are_case_sensitive() {
    assert_eq!(kinds("When")[0], TokenKind::Ident("When".into()));
    assert_eq!(kinds("when")[0], TokenKind::When);
}

#[test]
fn spans_track_lines() {
    let tokens = Lexer::tokenize_all("rule A\n  when");
    let when = &tokens[2];
    assert_eq!(when.kind, TokenKind::When);
    assert_eq!((when.span.line, when.span.column), (2, 3));
}

#[test]
fn unexpected_characters() {
    let tokens = kinds("a # b");
    assert!(matches!(&tokens[1], TokenKind::Error(_)));
}

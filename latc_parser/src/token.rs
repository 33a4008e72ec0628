//! Token definitions for the Lat lexer.

use logos::Logos;
use serde::Serialize;

/// Lat tokens
///
/// Line comments (`#…` and `//…`) and whitespace are skipped by the
/// derived lexer; string literals and block comments open here and are
/// finished by the scanner in [`crate::lexer`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // ==================== Keywords ====================
    #[token("class")]
    KwClass,
    #[token("extends")]
    KwExtends,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("for")]
    KwFor,
    #[token("new")]
    KwNew,
    #[token("null")]
    KwNull,
    #[token("void")]
    KwVoid,

    // ==================== Literals ====================
    #[token("true")]
    LitTrue,
    #[token("false")]
    LitFalse,
    #[regex(r"[0-9]+")]
    Number,
    /// Opening quote; the lexer wrapper extends the token over the whole
    /// literal, quotes included.
    #[token("\"")]
    StringLiteral,

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Name,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // ==================== Punctuation ====================
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // ==================== Operators ====================
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Not,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,

    /// `/*` — consumed by the lexer wrapper together with its body.
    #[token("/*")]
    BlockCommentStart,
}

impl Token {
    /// Human-readable token name for "expected …" messages.
    pub fn describe(self) -> &'static str {
        match self {
            Token::KwClass => "class",
            Token::KwExtends => "extends",
            Token::KwReturn => "return",
            Token::KwIf => "if",
            Token::KwElse => "else",
            Token::KwWhile => "while",
            Token::KwFor => "for",
            Token::KwNew => "new",
            Token::KwNull => "null",
            Token::KwVoid => "void",
            Token::LitTrue => "true",
            Token::LitFalse => "false",
            Token::Number => "number literal",
            Token::StringLiteral => "string literal",
            Token::Name => "name",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semicolon => ";",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Not => "!",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::BlockCommentStart => "/*",
        }
    }
}

//! Token type shared by the grammar graph and the parsing engine.

use serde::{Deserialize, Serialize};

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Language identifier.
    Identifier,
    /// Number, string, char, bool literal.
    Literal,
    Keyword,
    Operator,
    Separator,
}

/// A lexed token with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub col: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }

    pub fn ident(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Identifier, text, 0, 0)
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Literal, text, 0, 0)
    }

    pub fn keyword(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Keyword, text, 0, 0)
    }

    pub fn operator(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Operator, text, 0, 0)
    }

    pub fn separator(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Separator, text, 0, 0)
    }

    /// Whether a `TableData::Literal` entry with the given text matches this
    /// token. Identifiers and literals are matched through their token-kind
    /// markers instead, never by spelling.
    pub fn matches_literal(&self, text: &str) -> bool {
        !matches!(self.kind, TokenKind::Identifier | TokenKind::Literal) && self.text == text
    }
}

//! Tokens of the hotkey config DSL.

use std::fmt::{self, Display};

/// Kind of a lexed token.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    /// The `define_modifier` keyword.
    DefineModifier,
    /// Multi-character identifier: builtin or user-defined modifier,
    /// or a config property name.
    Modifier,
    /// Single character key.
    Key,
    /// `0x`-prefixed hexadecimal keycode; the token text holds the
    /// digits without the prefix.
    KeyHex,
    /// Named key from the fixed literal table.
    Literal,
    /// `+`
    Plus,
    /// `=`
    Equals,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `@` (passthrough flag)
    At,
    /// `^` (on-release flag)
    Caret,
    /// `&` (repeat flag)
    Ampersand,
    /// Entire remainder of the line after a colon.
    Command,
    EndOfFile,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::DefineModifier => "DefineModifier",
            TokenKind::Modifier => "Modifier",
            TokenKind::Key => "Key",
            TokenKind::KeyHex => "KeyHex",
            TokenKind::Literal => "Literal",
            TokenKind::Plus => "Plus",
            TokenKind::Equals => "Equals",
            TokenKind::Colon => "Colon",
            TokenKind::Comma => "Comma",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::OpenBrace => "OpenBrace",
            TokenKind::CloseBrace => "CloseBrace",
            TokenKind::At => "At",
            TokenKind::Caret => "Caret",
            TokenKind::Ampersand => "Ampersand",
            TokenKind::Command => "Command",
            TokenKind::EndOfFile => "EndOfFile",
        };
        f.write_str(name)
    }
}

/// A token with its text and 0-based source position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub row: usize,
    pub col: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, row: usize, col: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            row,
            col,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({}, {}, {})", self.text, self.kind, self.row, self.col)
    }
}

//! Hand-written recursive descent over the token stream.
//!
//! The parser builds the [`Program`] tree without expanding braces or
//! resolving modifier names; both happen in the interpreter. It is the
//! rejection point for malformed syntax: the lexer never fails.

use std::fmt::{self, Display};
use std::str::FromStr;

use hkkeys::{BuiltinModifier, LiteralKey};

use crate::ast::{
    ChordSyntax, ConfigPropertyStmt, DefineModifierStmt, HotkeyStmt, HotkeySyntax, KeyAtom,
    KeyAtomKind, KeySyntax, ModifierAtom, ModifierAtomKind, Pos, Program, Stmt,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Syntax error with the offending source position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    UnexpectedToken { found: Token, expected: &'static str },
    MissingEquals { found: Token },
    MissingCommand { row: usize },
    UnterminatedBrace { row: usize, col: usize },
    EmptyDefine { name: String, row: usize },
    InvalidPropertyValue { name: String, text: String, row: usize },
    InvalidHex { text: String, row: usize, col: usize },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { found, expected } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseError::MissingEquals { found } => {
                write!(f, "expected '=' after modifier name, found {found}")
            }
            ParseError::MissingCommand { row } => {
                write!(f, "expected command after ':' at row {row}")
            }
            ParseError::UnterminatedBrace { row, col } => {
                write!(f, "unterminated brace list at row {row}, col {col}")
            }
            ParseError::EmptyDefine { name, row } => {
                write!(f, "no expansions for custom modifier '{name}' at row {row}")
            }
            ParseError::InvalidPropertyValue { name, text, row } => {
                write!(f, "invalid value '{text}' for property '{name}' at row {row}")
            }
            ParseError::InvalidHex { text, row, col } => {
                write!(f, "invalid hex keycode '0x{text}' at row {row}, col {col}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Parser {
            lexer: Lexer::new(source),
        }
    }

    /// Parse the whole config into a [`Program`].
    ///
    /// # Errors
    ///
    /// Return the first [`ParseError`] encountered; the program is
    /// rejected as a whole.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        loop {
            match self.lexer.peek().kind {
                TokenKind::EndOfFile => break,
                TokenKind::DefineModifier => {
                    statements.push(Stmt::DefineModifier(self.parse_define_modifier()?));
                }
                TokenKind::Modifier => {
                    // An identifier opens either a config property
                    // (`name = int`) or a hotkey chord; the next token
                    // decides.
                    let first = self.lexer.next();
                    if self.lexer.peek().kind == TokenKind::Equals {
                        statements.push(Stmt::ConfigProperty(self.parse_config_property(first)?));
                    } else {
                        statements.push(Stmt::Hotkey(self.parse_hotkey(Some(first))?));
                    }
                }
                _ => statements.push(Stmt::Hotkey(self.parse_hotkey(None)?)),
            }
        }

        Ok(Program { statements })
    }

    /// `define_modifier NAME = atom (+ atom)*`, terminated by the end
    /// of the line it started on.
    fn parse_define_modifier(&mut self) -> Result<DefineModifierStmt, ParseError> {
        let keyword = self.lexer.next();

        let name = self.lexer.next();
        if !matches!(name.kind, TokenKind::Modifier | TokenKind::Key) {
            return Err(ParseError::UnexpectedToken {
                found: name,
                expected: "custom modifier name after define_modifier",
            });
        }

        let equals = self.lexer.next();
        if equals.kind != TokenKind::Equals {
            return Err(ParseError::MissingEquals { found: equals });
        }

        let mut parts = Vec::new();
        loop {
            let peeked = self.lexer.peek();
            if peeked.kind == TokenKind::EndOfFile || peeked.row != equals.row {
                break;
            }
            match peeked.kind {
                TokenKind::Plus => {
                    self.lexer.next();
                }
                TokenKind::Modifier | TokenKind::Key => {
                    let tok = self.lexer.next();
                    parts.push(modifier_atom(&tok));
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(ParseError::EmptyDefine {
                name: name.text,
                row: keyword.row,
            });
        }

        Ok(DefineModifierStmt {
            name: name.text,
            parts,
            pos: pos_of(&keyword),
        })
    }

    /// `name = integer`, the name token already consumed.
    fn parse_config_property(&mut self, name: Token) -> Result<ConfigPropertyStmt, ParseError> {
        // The '=' was peeked by the caller.
        self.lexer.next();

        let value = self.lexer.next();
        let numeric = matches!(value.kind, TokenKind::Modifier | TokenKind::Key)
            && value.text.chars().all(|c| c.is_ascii_digit());
        let parsed = if numeric {
            value.text.parse::<i64>().ok()
        } else {
            None
        };

        let pos = pos_of(&name);
        match parsed {
            Some(number) => Ok(ConfigPropertyStmt {
                name: name.text,
                value: number,
                pos,
            }),
            None => Err(ParseError::InvalidPropertyValue {
                name: name.text,
                text: value.text,
                row: value.row,
            }),
        }
    }

    /// `flag* (modifier +)* key (; chord)* : command`
    fn parse_hotkey(&mut self, first: Option<Token>) -> Result<HotkeyStmt, ParseError> {
        let mut syntax = HotkeySyntax::default();
        let mut chord = ChordSyntax::default();

        if let Some(tok) = first {
            chord.modifiers.push(modifier_atom(&tok));
        }

        loop {
            match self.lexer.peek().kind {
                TokenKind::At => {
                    self.lexer.next();
                    syntax.passthrough = true;
                }
                TokenKind::Ampersand => {
                    self.lexer.next();
                    syntax.repeat = true;
                }
                TokenKind::Caret => {
                    self.lexer.next();
                    syntax.on_release = true;
                }
                TokenKind::Plus => {
                    self.lexer.next();
                }
                TokenKind::Modifier => {
                    let tok = self.lexer.next();
                    if chord.key.is_some() {
                        return Err(ParseError::UnexpectedToken {
                            found: tok,
                            expected: "';' or ':' after the chord key",
                        });
                    }
                    chord.modifiers.push(modifier_atom(&tok));
                }
                TokenKind::Key | TokenKind::Literal | TokenKind::KeyHex => {
                    let tok = self.lexer.next();
                    if chord.key.is_some() {
                        return Err(ParseError::UnexpectedToken {
                            found: tok,
                            expected: "';' or ':' after the chord key",
                        });
                    }
                    chord.key = Some(KeySyntax::single(key_atom(&tok)?));
                }
                TokenKind::OpenBrace => {
                    let open = self.lexer.next();
                    if chord.key.is_some() {
                        return Err(ParseError::UnexpectedToken {
                            found: open,
                            expected: "';' or ':' after the chord key",
                        });
                    }
                    chord.key = Some(self.parse_brace_list(&open)?);
                }
                TokenKind::Semicolon => {
                    self.lexer.next();
                    syntax.chords.push(std::mem::take(&mut chord));
                }
                TokenKind::Colon => {
                    self.lexer.next();
                    syntax.chords.push(std::mem::take(&mut chord));

                    let command = self.lexer.next();
                    if command.kind != TokenKind::Command {
                        return Err(ParseError::MissingCommand { row: command.row });
                    }
                    return Ok(HotkeyStmt {
                        syntax,
                        command: command.text,
                    });
                }
                _ => {
                    let tok = self.lexer.next();
                    return Err(ParseError::UnexpectedToken {
                        found: tok,
                        expected: "hotkey syntax",
                    });
                }
            }
        }
    }

    /// `{ key (, key)* }`, the opening brace already consumed.
    fn parse_brace_list(&mut self, open: &Token) -> Result<KeySyntax, ParseError> {
        let mut items = Vec::new();

        loop {
            let tok = self.lexer.next();
            match tok.kind {
                TokenKind::Key | TokenKind::Literal | TokenKind::KeyHex => {
                    items.push(key_atom(&tok)?);
                }
                TokenKind::EndOfFile => {
                    return Err(ParseError::UnterminatedBrace {
                        row: open.row,
                        col: open.col,
                    });
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: tok,
                        expected: "key inside brace list",
                    });
                }
            }

            let separator = self.lexer.next();
            match separator.kind {
                TokenKind::Comma => {}
                TokenKind::CloseBrace => break,
                TokenKind::EndOfFile => {
                    return Err(ParseError::UnterminatedBrace {
                        row: open.row,
                        col: open.col,
                    });
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: separator,
                        expected: "',' or '}' in brace list",
                    });
                }
            }
        }

        Ok(KeySyntax {
            brace_expansion: true,
            items,
        })
    }
}

fn pos_of(token: &Token) -> Pos {
    Pos::new(token.row, token.col)
}

fn modifier_atom(token: &Token) -> ModifierAtom {
    let kind = match BuiltinModifier::parse(&token.text) {
        Some(builtin) => ModifierAtomKind::Builtin(builtin),
        None => ModifierAtomKind::Name(token.text.clone()),
    };
    ModifierAtom {
        kind,
        pos: pos_of(token),
    }
}

fn key_atom(token: &Token) -> Result<KeyAtom, ParseError> {
    let kind = match token.kind {
        TokenKind::Literal => match LiteralKey::from_str(&token.text) {
            Ok(literal) => KeyAtomKind::Literal(literal),
            Err(_) => {
                return Err(ParseError::UnexpectedToken {
                    found: token.clone(),
                    expected: "literal key name",
                });
            }
        },
        TokenKind::KeyHex => match u32::from_str_radix(&token.text, 16) {
            Ok(value) => KeyAtomKind::Hex(value),
            Err(_) => {
                return Err(ParseError::InvalidHex {
                    text: token.text.clone(),
                    row: token.row,
                    col: token.col,
                });
            }
        },
        _ => match token.text.chars().next() {
            Some(c) => KeyAtomKind::Char(c),
            None => {
                return Err(ParseError::UnexpectedToken {
                    found: token.clone(),
                    expected: "key",
                });
            }
        },
    };

    Ok(KeyAtom {
        kind,
        pos: pos_of(token),
    })
}

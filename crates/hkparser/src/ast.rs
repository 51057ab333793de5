//! Abstract syntax tree of the config DSL.
//!
//! The tree separates syntax from execution: brace expansion and
//! modifier aliases are captured structurally here and resolved by the
//! interpreter. Every atom keeps the position of its originating token
//! for diagnostics.

use hkkeys::{BuiltinModifier, LiteralKey};

/// 0-based source position of a token.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

/// A modifier reference: builtin, or a user-defined alias name.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModifierAtom {
    pub kind: ModifierAtomKind,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ModifierAtomKind {
    Builtin(BuiltinModifier),
    Name(String),
}

/// A key reference inside a chord.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KeyAtom {
    pub kind: KeyAtomKind,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum KeyAtomKind {
    /// Named key from the fixed table.
    Literal(LiteralKey),
    /// Single layout character.
    Char(char),
    /// Hex keycode; the value is used verbatim.
    Hex(u32),
}

/// A chord's key: a single atom, or a brace-expansion list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KeySyntax {
    pub brace_expansion: bool,
    /// Single item unless `brace_expansion` is set.
    pub items: Vec<KeyAtom>,
}

impl KeySyntax {
    #[must_use]
    pub fn single(atom: KeyAtom) -> Self {
        KeySyntax {
            brace_expansion: false,
            items: vec![atom],
        }
    }
}

/// One chord as written: modifier atoms plus an optional key.
///
/// The key is unset only while a malformed statement omits it; the
/// interpreter rejects chords without keys.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ChordSyntax {
    pub modifiers: Vec<ModifierAtom>,
    pub key: Option<KeySyntax>,
}

impl ChordSyntax {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.key.is_none()
    }
}

/// Hotkey syntax: per-statement flags and the chord list.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct HotkeySyntax {
    pub passthrough: bool,
    pub repeat: bool,
    pub on_release: bool,
    pub chords: Vec<ChordSyntax>,
}

/// `define_modifier NAME = atom (+ atom)*`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DefineModifierStmt {
    pub name: String,
    pub parts: Vec<ModifierAtom>,
    pub pos: Pos,
}

/// `name = integer` (milliseconds for the current properties).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConfigPropertyStmt {
    pub name: String,
    pub value: i64,
    pub pos: Pos,
}

/// `chords : command`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HotkeyStmt {
    pub syntax: HotkeySyntax,
    /// Raw command; may contain an unexpanded brace list.
    pub command: String,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Stmt {
    DefineModifier(DefineModifierStmt),
    ConfigProperty(ConfigPropertyStmt),
    Hotkey(HotkeyStmt),
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

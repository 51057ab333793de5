//! Semantic pass: resolve modifier aliases, expand brace macros and
//! compile the hotkey table.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::time::Duration;

use smallvec::SmallVec;
use tracing::warn;

use hkkeys::{
    Chord, CompiledTable, ConfigProperties, Hotkey, KeycodeError, KeycodeRegistry, ModifierMask,
};

use crate::ast::{
    ChordSyntax, DefineModifierStmt, HotkeyStmt, KeyAtom, KeyAtomKind, ModifierAtom,
    ModifierAtomKind, Pos, Program, Stmt,
};

/// Semantic error raised while compiling a parsed program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CompileError {
    /// A `define_modifier` chain references itself.
    CyclicModifier { name: String },
    /// A config property name is not recognised.
    UnknownProperty { name: String, pos: Pos },
    /// Brace-expanded keys and commands differ in count.
    MismatchedExpansion { keys: usize, commands: usize },
    /// More than one chord of a hotkey uses a brace-expanded key.
    TooManyBraceChords { pos: Pos },
    /// A chord has no key.
    MissingKey { pos: Pos },
    /// A key name did not resolve to a keycode.
    UnknownKey { name: String, pos: Pos },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::CyclicModifier { name } => {
                write!(f, "cyclic define_modifier detected: '{name}'")
            }
            CompileError::UnknownProperty { name, pos } => {
                write!(f, "unknown config property '{name}' at row {}", pos.row)
            }
            CompileError::MismatchedExpansion { keys, commands } => write!(
                f,
                "expansion keys and commands must be the same size ({keys} keys, {commands} commands)"
            ),
            CompileError::TooManyBraceChords { pos } => write!(
                f,
                "at most one chord per hotkey may use a brace expansion (row {})",
                pos.row
            ),
            CompileError::MissingKey { pos } => {
                write!(f, "chord missing a key at row {}", pos.row)
            }
            CompileError::UnknownKey { name, pos } => write!(
                f,
                "unknown key '{name}' at row {}, col {}",
                pos.row, pos.col
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Resolves modifier alias names to their combined mask.
///
/// Resolution recurses through user-defined aliases with a visited set
/// for cycle detection and caches results by name. Unknown names
/// resolve to the empty mask; the caller decides whether that warrants
/// a warning.
struct DefineResolver {
    defines: HashMap<String, Vec<ModifierAtom>>,
    cache: HashMap<String, ModifierMask>,
    resolving: HashSet<String>,
}

impl DefineResolver {
    fn new(defines: Vec<DefineModifierStmt>) -> Self {
        DefineResolver {
            defines: defines
                .into_iter()
                .map(|stmt| (stmt.name, stmt.parts))
                .collect(),
            cache: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    fn resolve(&mut self, name: &str) -> Result<ModifierMask, CompileError> {
        if self.resolving.contains(name) {
            return Err(CompileError::CyclicModifier {
                name: name.to_string(),
            });
        }
        if let Some(&mask) = self.cache.get(name) {
            return Ok(mask);
        }

        if let Some(builtin) = hkkeys::BuiltinModifier::parse(name) {
            let mask = builtin.flag();
            self.cache.insert(name.to_string(), mask);
            return Ok(mask);
        }

        self.resolving.insert(name.to_string());
        let result = self.resolve_custom(name);
        self.resolving.remove(name);

        let mask = result?;
        self.cache.insert(name.to_string(), mask);
        Ok(mask)
    }

    fn resolve_custom(&mut self, name: &str) -> Result<ModifierMask, CompileError> {
        let Some(parts) = self.defines.get(name).cloned() else {
            return Ok(ModifierMask::empty());
        };

        let mut mask = ModifierMask::empty();
        for part in &parts {
            let part_mask = match &part.kind {
                ModifierAtomKind::Builtin(builtin) => builtin.flag(),
                ModifierAtomKind::Name(sub) => self.resolve(sub)?,
            };
            if part_mask.is_empty() {
                // An unknown constituent poisons the whole alias.
                return Ok(ModifierMask::empty());
            }
            mask |= part_mask;
        }
        Ok(mask)
    }
}

/// Compiles a [`Program`] into the dispatch table and config
/// properties.
pub struct Interpreter<'a> {
    registry: &'a KeycodeRegistry,
}

impl<'a> Interpreter<'a> {
    #[must_use]
    pub fn new(registry: &'a KeycodeRegistry) -> Self {
        Interpreter { registry }
    }

    /// Run the semantic pass over a parsed program.
    ///
    /// # Errors
    ///
    /// Return the first [`CompileError`]; the program is rejected as a
    /// whole and any previously compiled table stays in effect.
    pub fn interpret(
        &self,
        program: &Program,
    ) -> Result<(CompiledTable, ConfigProperties), CompileError> {
        let mut defines = Vec::new();
        let mut properties = Vec::new();
        let mut hotkeys = Vec::new();

        for stmt in &program.statements {
            match stmt {
                Stmt::DefineModifier(define) => defines.push(define.clone()),
                Stmt::ConfigProperty(property) => properties.push(property.clone()),
                Stmt::Hotkey(hotkey) => hotkeys.push(hotkey),
            }
        }

        let mut resolver = DefineResolver::new(defines);

        let mut config = ConfigProperties::default();
        for property in &properties {
            let millis = Duration::from_millis(property.value.unsigned_abs());
            match property.name.as_str() {
                "max_chord_interval" => config.max_chord_interval = millis,
                "hold_modifier_threshold" => config.hold_modifier_threshold = millis,
                "simultaneous_threshold" => config.simultaneous_threshold = millis,
                _ => {
                    return Err(CompileError::UnknownProperty {
                        name: property.name.clone(),
                        pos: property.pos,
                    });
                }
            }
        }

        let mut table = CompiledTable::new();
        for stmt in hotkeys {
            self.compile_hotkey(stmt, &mut resolver, &mut table)?;
        }

        Ok((table, config))
    }

    fn compile_hotkey(
        &self,
        stmt: &HotkeyStmt,
        resolver: &mut DefineResolver,
        table: &mut CompiledTable,
    ) -> Result<(), CompileError> {
        let syntax = &stmt.syntax;

        // Premix each chord's modifier mask; keys are filled in per
        // expansion below.
        let mut base = Hotkey {
            chords: SmallVec::new(),
            passthrough: syntax.passthrough,
            repeat: syntax.repeat,
            on_release: syntax.on_release,
        };
        for chord_syntax in &syntax.chords {
            let mut mask = ModifierMask::empty();
            for atom in &chord_syntax.modifiers {
                let atom_mask = match &atom.kind {
                    ModifierAtomKind::Builtin(builtin) => builtin.flag(),
                    ModifierAtomKind::Name(name) => {
                        let resolved = resolver.resolve(name)?;
                        if resolved.is_empty() {
                            warn!(
                                "unknown modifier '{}' at row {}, col {}",
                                name, atom.pos.row, atom.pos.col
                            );
                        }
                        resolved
                    }
                };
                mask |= atom_mask;
            }
            base.chords.push(Chord::new(0, mask));
        }

        let brace_chords: Vec<usize> = syntax
            .chords
            .iter()
            .enumerate()
            .filter(|(_, c)| c.key.as_ref().is_some_and(|k| k.brace_expansion))
            .map(|(i, _)| i)
            .collect();
        if brace_chords.len() > 1 {
            let pos = chord_pos(&syntax.chords[brace_chords[1]]);
            return Err(CompileError::TooManyBraceChords { pos });
        }

        let Some(&brace_index) = brace_chords.first() else {
            // No expansion: fill each chord's key and emit one hotkey.
            let mut hotkey = base;
            for (i, chord_syntax) in syntax.chords.iter().enumerate() {
                let atom = single_atom(chord_syntax)?;
                self.apply_key_atom(&mut hotkey.chords[i], atom)?;
            }
            table.insert(hotkey, stmt.command.clone());
            return Ok(());
        };

        let items: &[KeyAtom] = syntax.chords[brace_index]
            .key
            .as_ref()
            .map_or(&[], |k| k.items.as_slice());

        let commands = expand_command(&stmt.command);
        if let Some(ref pieces) = commands {
            if pieces.len() != items.len() {
                return Err(CompileError::MismatchedExpansion {
                    keys: items.len(),
                    commands: pieces.len(),
                });
            }
        }

        for (i, item) in items.iter().enumerate() {
            let mut hotkey = base.clone();
            for (ci, chord_syntax) in syntax.chords.iter().enumerate() {
                let atom = if ci == brace_index {
                    item
                } else {
                    single_atom(chord_syntax)?
                };
                self.apply_key_atom(&mut hotkey.chords[ci], atom)?;
            }
            let command = match &commands {
                Some(pieces) => pieces[i].clone(),
                None => stmt.command.clone(),
            };
            table.insert(hotkey, command);
        }

        Ok(())
    }

    /// Fill a chord's keycode from a key atom, attaching any implicit
    /// `FN`/`NX` bits of literal keys.
    fn apply_key_atom(&self, chord: &mut Chord, atom: &KeyAtom) -> Result<(), CompileError> {
        match &atom.kind {
            KeyAtomKind::Literal(literal) => {
                chord.keycode = literal.keycode();
                chord.modifiers |= literal.implicit_flags();
            }
            KeyAtomKind::Char(c) => {
                chord.keycode = self
                    .registry
                    .keycode_of(&c.to_string())
                    .map_err(|err| match err {
                        KeycodeError::Unknown(name) => CompileError::UnknownKey {
                            name,
                            pos: atom.pos,
                        },
                    })?;
            }
            KeyAtomKind::Hex(value) => chord.keycode = *value,
        }
        Ok(())
    }
}

fn chord_pos(chord: &ChordSyntax) -> Pos {
    chord
        .key
        .as_ref()
        .and_then(|k| k.items.first())
        .map(|a| a.pos)
        .or_else(|| chord.modifiers.first().map(|m| m.pos))
        .unwrap_or_default()
}

fn single_atom(chord: &ChordSyntax) -> Result<&KeyAtom, CompileError> {
    chord
        .key
        .as_ref()
        .and_then(|k| k.items.first())
        .ok_or(CompileError::MissingKey {
            pos: chord_pos(chord),
        })
}

/// Expand the first `{a,b,c}` list in a command into its pieces,
/// preserving prefix and suffix.
///
/// Return `None` when the command has no brace list; every expanded
/// hotkey then shares the original command.
fn expand_command(command: &str) -> Option<Vec<String>> {
    let start = command.find('{')?;
    let end = command.find('}')?;
    if start > end {
        return None;
    }

    let prefix = &command[..start];
    let content = &command[start + 1..end];
    let suffix = &command[end + 1..];

    if content.is_empty() {
        return None;
    }

    Some(
        content
            .split(',')
            .map(|piece| format!("{prefix}{piece}{suffix}"))
            .collect(),
    )
}

//! Compiled hotkeys and the table the engine dispatches against.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::time::Duration;

use smallvec::SmallVec;

use crate::chord::Chord;

/// A compiled hotkey: one or more chords plus dispatch flags.
///
/// A chord list longer than one is a sequence that must be produced
/// chord by chord within the configured interval. The derived ordering
/// (chord list first, then flags) keys the compiled table so reloads
/// iterate deterministically.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Hotkey {
    pub chords: SmallVec<[Chord; 2]>,
    /// Forward the event to the OS even when the hotkey fires.
    pub passthrough: bool,
    /// Re-fire on autorepeated key events.
    pub repeat: bool,
    /// Fire on key-up instead of key-down.
    pub on_release: bool,
}

impl Hotkey {
    /// Whether this hotkey is a multi-chord sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.chords.len() > 1
    }
}

impl Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passthrough {
            f.write_str("@ ")?;
        }
        if self.repeat {
            f.write_str("& ")?;
        }
        if self.on_release {
            f.write_str("^ ")?;
        }
        let mut first = true;
        for chord in &self.chords {
            if !first {
                f.write_str(" ; ")?;
            }
            first = false;
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

/// Mapping from compiled hotkey to its shell command.
///
/// Immutable between reloads; the orchestrator publishes a fresh table
/// and the engine swaps it in between events.
pub type CompiledTable = BTreeMap<Hotkey, String>;

/// Timing knobs settable from the config file, all in milliseconds on
/// the wire.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ConfigProperties {
    /// Maximum inter-chord delay in a sequence before the engine
    /// resets.
    pub max_chord_interval: Duration,
    /// Minimum hold time for the hold-as-modifier experiment; parsed
    /// and stored, not acted upon.
    pub hold_modifier_threshold: Duration,
    /// Maximum gap between simultaneously pressed keys; reserved for
    /// multi-key chords.
    pub simultaneous_threshold: Duration,
}

impl Default for ConfigProperties {
    fn default() -> Self {
        ConfigProperties {
            max_chord_interval: Duration::from_millis(3000),
            hold_modifier_threshold: Duration::from_millis(500),
            simultaneous_threshold: Duration::from_millis(100),
        }
    }
}

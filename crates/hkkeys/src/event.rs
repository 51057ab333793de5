//! Key events delivered by the OS tap and the decisions returned to it.

use std::fmt::{self, Display};

use crate::chord::Chord;
use crate::keycode::Keycode;
use crate::modifier::{EventFlags, ModifierMask};

/// Direction of a key event.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum KeyEventKind {
    Down,
    Up,
}

impl Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEventKind::Down => f.write_str("Down"),
            KeyEventKind::Up => f.write_str("Up"),
        }
    }
}

/// One keyboard event as delivered by the OS event tap.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub keycode: Keycode,
    /// Raw OS modifier bits; decoded lazily via [`KeyEvent::chord`].
    pub flags: EventFlags,
    pub is_autorepeat: bool,
}

impl KeyEvent {
    #[must_use]
    pub const fn down(keycode: Keycode, flags: EventFlags) -> Self {
        KeyEvent {
            kind: KeyEventKind::Down,
            keycode,
            flags,
            is_autorepeat: false,
        }
    }

    #[must_use]
    pub const fn up(keycode: Keycode, flags: EventFlags) -> Self {
        KeyEvent {
            kind: KeyEventKind::Up,
            keycode,
            flags,
            is_autorepeat: false,
        }
    }

    /// Mark the event as an autorepeat.
    #[must_use]
    pub const fn autorepeat(mut self) -> Self {
        self.is_autorepeat = true;
        self
    }

    /// The observed chord of this event, with decoded modifiers.
    #[must_use]
    pub fn chord(&self) -> Chord {
        Chord::new(self.keycode, ModifierMask::from_event_flags(self.flags))
    }
}

/// What the engine tells the OS event tap to do with an event.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    /// Suppress further delivery of the event.
    Consume,
    /// Let the event reach the focused application.
    Passthrough,
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Consume => f.write_str("Consume"),
            Decision::Passthrough => f.write_str("Passthrough"),
        }
    }
}

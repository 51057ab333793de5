//! A chord is one instant of simultaneous key pressure.

use std::fmt::{self, Display};

use crate::keycode::Keycode;
use crate::modifier::ModifierMask;

/// A single `(keycode, modifiers)` pair.
///
/// Configured chords may carry generic modifier bits; observed chords
/// decoded from events carry concrete sides.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Chord {
    pub keycode: Keycode,
    pub modifiers: ModifierMask,
}

impl Chord {
    #[must_use]
    pub const fn new(keycode: Keycode, modifiers: ModifierMask) -> Self {
        Chord { keycode, modifiers }
    }

    /// Check whether this configured chord accepts an observed chord:
    /// same keycode and the modifier activation relation of
    /// [`ModifierMask::is_activated_by`].
    #[must_use]
    pub fn is_activated_by(&self, other: &Chord) -> bool {
        self.keycode == other.keycode && self.modifiers.is_activated_by(other.modifiers)
    }
}

impl Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "0x{:x}", self.keycode)
        } else {
            write!(f, "{} + 0x{:x}", self.modifiers, self.keycode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_requires_same_keycode() {
        let config = Chord::new(0x0C, ModifierMask::CMD);
        assert!(config.is_activated_by(&Chord::new(0x0C, ModifierMask::LCMD)));
        assert!(!config.is_activated_by(&Chord::new(0x0D, ModifierMask::LCMD)));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Chord::new(0x24, ModifierMask::empty()).to_string(), "0x24");
        assert_eq!(
            Chord::new(0x24, ModifierMask::CMD).to_string(),
            "cmd + 0x24"
        );
    }
}

//! Key name to keycode resolution.
//!
//! Two sources feed the mapping: a fixed 47-entry table of named keys
//! (`return`, `f1`, `mute`, ...) whose virtual keycodes never change,
//! and a layout-dependent map for the 36 character keys A-Z and 0-9,
//! which the host keyboard layout supplies at startup.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::modifier::ModifierMask;

/// Numeric identifier of a physical key on the current layout.
pub type Keycode = u32;

/// Named keys with fixed keycodes, in table order.
///
/// The table index encodes implicit modifiers: entries 5..=34 (the
/// navigation block and the function keys) carry the `Fn` bit, entries
/// 35..=46 (the media block) carry the `NX` bit.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum LiteralKey {
    Return,
    Tab,
    Space,
    Backspace,
    Escape,
    Delete,
    Home,
    End,
    Pageup,
    Pagedown,
    Insert,
    Left,
    Right,
    Up,
    Down,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    SoundUp,
    SoundDown,
    Mute,
    Play,
    Previous,
    Next,
    Rewind,
    Fast,
    BrightnessUp,
    BrightnessDown,
    IlluminationUp,
    IlluminationDown,
}

/// Last table index whose key carries no implicit modifier.
const LAST_PLAIN_KEY: usize = 4;
/// First table index of the NX media block.
const FIRST_NX_KEY: usize = 35;

/// Virtual keycodes for [`LiteralKey`], indexed by variant order.
///
/// Entries 0..=34 are macOS `kVK_*` values; the media block holds NX
/// key types delivered through system-defined events.
const LITERAL_KEYCODES: [Keycode; 47] = [
    0x24, // return
    0x30, // tab
    0x31, // space
    0x33, // backspace
    0x35, // escape
    0x75, // delete
    0x73, // home
    0x77, // end
    0x74, // pageup
    0x79, // pagedown
    0x72, // insert
    0x7B, // left
    0x7C, // right
    0x7E, // up
    0x7D, // down
    0x7A, // f1
    0x78, // f2
    0x63, // f3
    0x76, // f4
    0x60, // f5
    0x61, // f6
    0x62, // f7
    0x64, // f8
    0x65, // f9
    0x6D, // f10
    0x67, // f11
    0x6F, // f12
    0x69, // f13
    0x6B, // f14
    0x71, // f15
    0x6A, // f16
    0x40, // f17
    0x4F, // f18
    0x50, // f19
    0x5A, // f20
    0,    // sound_up
    1,    // sound_down
    7,    // mute
    16,   // play
    18,   // previous
    17,   // next
    20,   // rewind
    19,   // fast
    2,    // brightness_up
    3,    // brightness_down
    21,   // illumination_up
    22,   // illumination_down
];

/// ANSI (US) virtual keycodes for the 36 layout-dependent keys.
///
/// Used as the fallback layout; a host layout query replaces this map
/// via [`KeycodeRegistry::from_pairs`].
const ANSI_LAYOUT: [(char, Keycode); 36] = [
    ('a', 0x00),
    ('b', 0x0B),
    ('c', 0x08),
    ('d', 0x02),
    ('e', 0x0E),
    ('f', 0x03),
    ('g', 0x05),
    ('h', 0x04),
    ('i', 0x22),
    ('j', 0x26),
    ('k', 0x28),
    ('l', 0x25),
    ('m', 0x2E),
    ('n', 0x2D),
    ('o', 0x1F),
    ('p', 0x23),
    ('q', 0x0C),
    ('r', 0x0F),
    ('s', 0x01),
    ('t', 0x11),
    ('u', 0x20),
    ('v', 0x09),
    ('w', 0x0D),
    ('x', 0x07),
    ('y', 0x10),
    ('z', 0x06),
    ('0', 0x1D),
    ('1', 0x12),
    ('2', 0x13),
    ('3', 0x14),
    ('4', 0x15),
    ('5', 0x17),
    ('6', 0x16),
    ('7', 0x1A),
    ('8', 0x1C),
    ('9', 0x19),
];

impl LiteralKey {
    /// Position of this key in the fixed table.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The fixed keycode of this key.
    #[must_use]
    pub fn keycode(self) -> Keycode {
        LITERAL_KEYCODES[self.index()]
    }

    /// Implicit modifier bits attached when this key is compiled into a
    /// chord: `FN` for the navigation/function block, `NX` for media
    /// keys.
    #[must_use]
    pub fn implicit_flags(self) -> ModifierMask {
        let index = self.index();
        if index > LAST_PLAIN_KEY && index < FIRST_NX_KEY {
            ModifierMask::FN
        } else if index >= FIRST_NX_KEY {
            ModifierMask::NX
        } else {
            ModifierMask::empty()
        }
    }

    /// Reverse lookup from a keycode, scanning in table order.
    #[must_use]
    pub fn from_keycode(code: Keycode) -> Option<Self> {
        LiteralKey::iter().find(|key| key.keycode() == code)
    }
}

/// Failure to resolve a key name to a keycode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeycodeError {
    /// The name is neither a layout character, a literal key, nor a
    /// hexadecimal keycode.
    Unknown(String),
}

impl Display for KeycodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeycodeError::Unknown(name) => write!(f, "keycode not found for '{name}'"),
        }
    }
}

impl std::error::Error for KeycodeError {}

/// Process-wide mapping between key names and keycodes.
///
/// Built once at startup from the current keyboard layout and treated
/// as immutable thereafter; layout changes mid-run are not tracked.
#[derive(Debug, Clone)]
pub struct KeycodeRegistry {
    layout: HashMap<char, Keycode>,
}

impl KeycodeRegistry {
    /// Registry over the fixed ANSI (US) layout.
    #[must_use]
    pub fn ansi() -> Self {
        Self::from_pairs(ANSI_LAYOUT)
    }

    /// Registry from a host layout query, one `(character, keycode)`
    /// pair per layout-dependent key.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (char, Keycode)>) -> Self {
        KeycodeRegistry {
            layout: pairs.into_iter().collect(),
        }
    }

    /// Resolve a key name to its keycode.
    ///
    /// Single characters go through the layout map; longer names through
    /// the literal table; anything else parses as a hexadecimal keycode
    /// (`1f` or `0x1f`).
    ///
    /// # Errors
    ///
    /// Return [`KeycodeError::Unknown`] if no source resolves the name.
    pub fn keycode_of(&self, name: &str) -> Result<Keycode, KeycodeError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(&code) = self.layout.get(&c) {
                return Ok(code);
            }
        }

        if let Ok(literal) = LiteralKey::from_str(name) {
            return Ok(literal.keycode());
        }

        let digits = name.strip_prefix("0x").unwrap_or(name);
        Keycode::from_str_radix(digits, 16).map_err(|_| KeycodeError::Unknown(name.to_string()))
    }

    /// Name of a keycode: layout map first, then the literal table, else
    /// the hexadecimal form.
    #[must_use]
    pub fn name_of(&self, code: Keycode) -> String {
        if let Some((&c, _)) = self.layout.iter().find(|&(_, &v)| v == code) {
            return c.to_string();
        }

        if let Some(literal) = LiteralKey::from_keycode(code) {
            return literal.as_ref().to_string();
        }

        format!("0x{code:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_table_has_47_entries() {
        assert_eq!(LiteralKey::iter().count(), 47);
        assert_eq!(LiteralKey::IlluminationDown.index(), 46);
    }

    #[test]
    fn literal_names_round_trip() {
        for key in LiteralKey::iter() {
            assert_eq!(LiteralKey::from_str(key.as_ref()), Ok(key));
        }
        assert_eq!(LiteralKey::from_str("return"), Ok(LiteralKey::Return));
        assert_eq!(LiteralKey::from_str("pageup"), Ok(LiteralKey::Pageup));
        assert_eq!(LiteralKey::from_str("sound_up"), Ok(LiteralKey::SoundUp));
        assert!(LiteralKey::from_str("f21").is_err());
    }

    #[test]
    fn implicit_flag_ranges() {
        assert_eq!(LiteralKey::Return.implicit_flags(), ModifierMask::empty());
        assert_eq!(LiteralKey::Escape.implicit_flags(), ModifierMask::empty());
        assert_eq!(LiteralKey::Delete.implicit_flags(), ModifierMask::FN);
        assert_eq!(LiteralKey::F20.implicit_flags(), ModifierMask::FN);
        assert_eq!(LiteralKey::SoundUp.implicit_flags(), ModifierMask::NX);
        assert_eq!(
            LiteralKey::IlluminationDown.implicit_flags(),
            ModifierMask::NX
        );
    }

    #[test]
    fn layout_lookup() {
        let registry = KeycodeRegistry::ansi();
        assert_eq!(registry.keycode_of("a"), Ok(0x00));
        assert_eq!(registry.keycode_of("q"), Ok(0x0C));
        assert_eq!(registry.keycode_of("9"), Ok(0x19));
    }

    #[test]
    fn literal_lookup() {
        let registry = KeycodeRegistry::ansi();
        assert_eq!(registry.keycode_of("return"), Ok(0x24));
        assert_eq!(registry.keycode_of("mute"), Ok(7));
    }

    #[test]
    fn hex_lookup() {
        let registry = KeycodeRegistry::ansi();
        assert_eq!(registry.keycode_of("0x1f"), Ok(0x1F));
        assert_eq!(registry.keycode_of("1f"), Ok(0x1F));
        assert_eq!(
            registry.keycode_of("not_a_key"),
            Err(KeycodeError::Unknown("not_a_key".to_string()))
        );
    }

    #[test]
    fn name_of_prefers_layout_then_literals() {
        let registry = KeycodeRegistry::ansi();
        assert_eq!(registry.name_of(0x0C), "q");
        assert_eq!(registry.name_of(0x24), "return");
        assert_eq!(registry.name_of(0xFE), "0xfe");
    }

    #[test]
    fn custom_layout_overrides_ansi() {
        let registry = KeycodeRegistry::from_pairs([('a', 0x0C), ('q', 0x00)]);
        assert_eq!(registry.keycode_of("a"), Ok(0x0C));
        assert_eq!(registry.keycode_of("q"), Ok(0x00));
    }
}

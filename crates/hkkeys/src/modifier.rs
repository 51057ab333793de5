//! Modifier-key bitfield algebra with left/right/generic semantics.

use std::fmt::{self, Display};
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    /// Modifier state of a chord, configured or observed.
    ///
    /// For each of the four left/right-capable groups (Alt, Shift, Cmd,
    /// Ctrl) there is a *generic* bit meaning "either side" and two
    /// exact-side bits. A compiled chord never carries a generic bit
    /// together with a side bit of the same group. `FN` and `NX` are
    /// plain single bits.
    ///
    /// Side bits sit below their group's generic bit so side-specific
    /// chords order before generic ones in the compiled table; the
    /// dispatch loop takes the first match, which must be the more
    /// specific binding.
    #[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct ModifierMask: u16 {
        const LALT = 1 << 0;
        const RALT = 1 << 1;
        const ALT = 1 << 2;

        const LSHIFT = 1 << 3;
        const RSHIFT = 1 << 4;
        const SHIFT = 1 << 5;

        const LCMD = 1 << 6;
        const RCMD = 1 << 7;
        const CMD = 1 << 8;

        const LCTRL = 1 << 9;
        const RCTRL = 1 << 10;
        const CTRL = 1 << 11;

        const FN = 1 << 12;

        const NX = 1 << 13;
    }
}

impl Default for ModifierMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// The four left/right-capable groups as `(generic, left, right)` bits.
const LR_GROUPS: &[(ModifierMask, ModifierMask, ModifierMask)] = &[
    (ModifierMask::ALT, ModifierMask::LALT, ModifierMask::RALT),
    (ModifierMask::SHIFT, ModifierMask::LSHIFT, ModifierMask::RSHIFT),
    (ModifierMask::CMD, ModifierMask::LCMD, ModifierMask::RCMD),
    (ModifierMask::CTRL, ModifierMask::LCTRL, ModifierMask::RCTRL),
];

/// Display names in bit order, used by [`Display`] and the observer.
const MODIFIER_NAMES: &[(ModifierMask, &str)] = &[
    (ModifierMask::ALT, "alt"),
    (ModifierMask::LALT, "lalt"),
    (ModifierMask::RALT, "ralt"),
    (ModifierMask::SHIFT, "shift"),
    (ModifierMask::LSHIFT, "lshift"),
    (ModifierMask::RSHIFT, "rshift"),
    (ModifierMask::CMD, "cmd"),
    (ModifierMask::LCMD, "lcmd"),
    (ModifierMask::RCMD, "rcmd"),
    (ModifierMask::CTRL, "ctrl"),
    (ModifierMask::LCTRL, "lctrl"),
    (ModifierMask::RCTRL, "rctrl"),
    (ModifierMask::FN, "fn"),
    (ModifierMask::NX, "nx"),
];

impl ModifierMask {
    /// Check whether a chord configured with `self` accepts an event
    /// carrying `event` modifiers.
    ///
    /// Per group: a generic config bit accepts generic, left or right on
    /// the event side; a config without the generic bit requires all
    /// three bits of the group to match exactly. `FN` and `NX` always
    /// require exact equality. The relation is asymmetric: `alt + x`
    /// fires on either physical Alt, `lalt + x` only on the left one.
    #[must_use]
    pub fn is_activated_by(self, event: ModifierMask) -> bool {
        for &(generic, left, right) in LR_GROUPS {
            if self.contains(generic) {
                if !(event.contains(generic) || event.contains(left) || event.contains(right)) {
                    return false;
                }
            } else if self.contains(left) != event.contains(left)
                || self.contains(right) != event.contains(right)
                || self.contains(generic) != event.contains(generic)
            {
                return false;
            }
        }

        self.contains(ModifierMask::FN) == event.contains(ModifierMask::FN)
            && self.contains(ModifierMask::NX) == event.contains(ModifierMask::NX)
    }

    /// Decode raw OS event flags into a modifier mask.
    ///
    /// For each group: when the "any side" mask is reported, the device
    /// side bits select the exact-side flags; if neither side is
    /// reported only the generic flag is set. `FN` and `NX` map to
    /// their single bits.
    #[must_use]
    pub fn from_event_flags(flags: EventFlags) -> Self {
        const DEVICE_SIDES: &[(EventFlags, EventFlags, EventFlags, usize)] = &[
            (EventFlags::ALT, EventFlags::DEVICE_LALT, EventFlags::DEVICE_RALT, 0),
            (
                EventFlags::SHIFT,
                EventFlags::DEVICE_LSHIFT,
                EventFlags::DEVICE_RSHIFT,
                1,
            ),
            (EventFlags::CMD, EventFlags::DEVICE_LCMD, EventFlags::DEVICE_RCMD, 2),
            (
                EventFlags::CTRL,
                EventFlags::DEVICE_LCTRL,
                EventFlags::DEVICE_RCTRL,
                3,
            ),
        ];

        let mut mask = ModifierMask::empty();

        for &(any, device_left, device_right, group) in DEVICE_SIDES {
            if !flags.contains(any) {
                continue;
            }
            let (generic, left, right) = LR_GROUPS[group];
            let has_left = flags.contains(device_left);
            let has_right = flags.contains(device_right);
            if has_left {
                mask |= left;
            }
            if has_right {
                mask |= right;
            }
            if !has_left && !has_right {
                mask |= generic;
            }
        }

        if flags.contains(EventFlags::FN) {
            mask |= ModifierMask::FN;
        }
        if flags.contains(EventFlags::NX_KEY) {
            mask |= ModifierMask::NX;
        }

        mask
    }
}

impl Display for ModifierMask {
    /// Modifier names joined by ` + `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &(flag, name) in MODIFIER_NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" + ")?;
                }
                first = false;
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}

bitflags! {
    /// Raw modifier bits as delivered by the OS event tap.
    ///
    /// The layout mirrors macOS `CGEventFlags`: the "any side" masks sit
    /// in the high word, the per-device side bits in the low word.
    /// `NX_KEY` is a synthetic bit the tap sets for NX system-defined
    /// (media) key events, which have no CG flag of their own.
    #[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct EventFlags: u64 {
        const DEVICE_LCTRL = 0x0000_0001;
        const DEVICE_LSHIFT = 0x0000_0002;
        const DEVICE_RSHIFT = 0x0000_0004;
        const DEVICE_LCMD = 0x0000_0008;
        const DEVICE_RCMD = 0x0000_0010;
        const DEVICE_LALT = 0x0000_0020;
        const DEVICE_RALT = 0x0000_0040;
        const DEVICE_RCTRL = 0x0000_2000;

        const SHIFT = 0x0002_0000;
        const CTRL = 0x0004_0000;
        const ALT = 0x0008_0000;
        const CMD = 0x0010_0000;
        const FN = 0x0080_0000;

        const NX_KEY = 0x0100_0000;
    }
}

/// The thirteen builtin modifier names of the config DSL, in table
/// order `alt, lalt, ralt, shift, lshift, rshift, cmd, lcmd, rcmd,
/// ctrl, lctrl, rctrl, fn`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinModifier {
    Alt,
    Lalt,
    Ralt,
    Shift,
    Lshift,
    Rshift,
    Cmd,
    Lcmd,
    Rcmd,
    Ctrl,
    Lctrl,
    Rctrl,
    Fn,
}

impl BuiltinModifier {
    /// The mask bit this builtin contributes to a chord.
    #[must_use]
    pub fn flag(self) -> ModifierMask {
        match self {
            BuiltinModifier::Alt => ModifierMask::ALT,
            BuiltinModifier::Lalt => ModifierMask::LALT,
            BuiltinModifier::Ralt => ModifierMask::RALT,
            BuiltinModifier::Shift => ModifierMask::SHIFT,
            BuiltinModifier::Lshift => ModifierMask::LSHIFT,
            BuiltinModifier::Rshift => ModifierMask::RSHIFT,
            BuiltinModifier::Cmd => ModifierMask::CMD,
            BuiltinModifier::Lcmd => ModifierMask::LCMD,
            BuiltinModifier::Rcmd => ModifierMask::RCMD,
            BuiltinModifier::Ctrl => ModifierMask::CTRL,
            BuiltinModifier::Lctrl => ModifierMask::LCTRL,
            BuiltinModifier::Rctrl => ModifierMask::RCTRL,
            BuiltinModifier::Fn => ModifierMask::FN,
        }
    }

    /// Parse a builtin modifier name, `None` for custom names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generic_config_accepts_any_side() {
        let config = ModifierMask::ALT;
        assert!(config.is_activated_by(ModifierMask::ALT));
        assert!(config.is_activated_by(ModifierMask::LALT));
        assert!(config.is_activated_by(ModifierMask::RALT));
        assert!(!config.is_activated_by(ModifierMask::empty()));
        assert!(!config.is_activated_by(ModifierMask::LSHIFT));
    }

    #[test]
    fn side_config_demands_exact_side() {
        let config = ModifierMask::LALT;
        assert!(config.is_activated_by(ModifierMask::LALT));
        assert!(!config.is_activated_by(ModifierMask::RALT));
        assert!(!config.is_activated_by(ModifierMask::ALT));
        assert!(!config.is_activated_by(ModifierMask::LALT | ModifierMask::RALT));
    }

    #[test]
    fn fn_and_nx_require_exact_equality() {
        let config = ModifierMask::FN;
        assert!(config.is_activated_by(ModifierMask::FN));
        assert!(!config.is_activated_by(ModifierMask::empty()));
        assert!(!ModifierMask::empty().is_activated_by(ModifierMask::FN));
        assert!(!ModifierMask::empty().is_activated_by(ModifierMask::NX));
    }

    #[test]
    fn extra_event_groups_do_not_activate() {
        let config = ModifierMask::CMD;
        assert!(!config.is_activated_by(ModifierMask::CMD | ModifierMask::SHIFT));
    }

    #[test]
    fn decode_generic_only() {
        let mask = ModifierMask::from_event_flags(EventFlags::CMD);
        assert_eq!(mask, ModifierMask::CMD);
    }

    #[test]
    fn decode_sided() {
        let mask = ModifierMask::from_event_flags(EventFlags::CMD | EventFlags::DEVICE_LCMD);
        assert_eq!(mask, ModifierMask::LCMD);

        let mask = ModifierMask::from_event_flags(
            EventFlags::ALT | EventFlags::DEVICE_LALT | EventFlags::DEVICE_RALT,
        );
        assert_eq!(mask, ModifierMask::LALT | ModifierMask::RALT);
    }

    #[test]
    fn decode_fn_and_nx() {
        let mask = ModifierMask::from_event_flags(EventFlags::FN | EventFlags::NX_KEY);
        assert_eq!(mask, ModifierMask::FN | ModifierMask::NX);
    }

    #[test]
    fn decode_ignores_side_bits_without_any_mask() {
        // Device bits without the corresponding "any side" mask are stale.
        let mask = ModifierMask::from_event_flags(EventFlags::DEVICE_LCMD);
        assert_eq!(mask, ModifierMask::empty());
    }

    #[test]
    fn builtin_names_resolve_in_table_order() {
        assert_eq!(BuiltinModifier::parse("alt"), Some(BuiltinModifier::Alt));
        assert_eq!(BuiltinModifier::parse("rcmd"), Some(BuiltinModifier::Rcmd));
        assert_eq!(BuiltinModifier::parse("fn"), Some(BuiltinModifier::Fn));
        assert_eq!(BuiltinModifier::parse("hyper"), None);
    }

    #[test]
    fn display_joins_with_plus() {
        let mask = ModifierMask::CMD | ModifierMask::SHIFT;
        assert_eq!(mask.to_string(), "shift + cmd");
    }
}

//! Observer mode: print what each keyboard event looks like to the
//! engine, for writing configs.

use hkkeys::{Chord, Decision, KeyEvent, KeycodeRegistry, ModifierMask};

/// Observer escape hatch: Ctrl plus keycode 8 ends observation.
const OBSERVE_EXIT_CHORD: Chord = Chord::new(8, ModifierMask::CTRL);

/// Whether this event asks to leave observer mode.
#[must_use]
pub fn is_exit_event(event: &KeyEvent) -> bool {
    OBSERVE_EXIT_CHORD.is_activated_by(&event.chord())
}

/// Human-readable description of one event.
#[must_use]
pub fn describe(registry: &KeycodeRegistry, event: &KeyEvent) -> String {
    let chord = event.chord();
    format!(
        "key: {}\nkeycode: {:#02x}\nmodifiers: {}\nflags: {:014b}\nevent type: {}",
        registry.name_of(event.keycode),
        event.keycode,
        chord.modifiers,
        chord.modifiers.bits(),
        event.kind,
    )
}

/// Observer decision: everything is consumed so experiments do not
/// leak into the focused application.
#[must_use]
pub fn decision() -> Decision {
    Decision::Consume
}

#![warn(clippy::pedantic)]

pub mod chord;
pub mod event;
pub mod hotkey;
pub mod keycode;
pub mod modifier;

pub use chord::Chord;
pub use event::{Decision, KeyEvent, KeyEventKind};
pub use hotkey::{CompiledTable, ConfigProperties, Hotkey};
pub use keycode::{Keycode, KeycodeError, KeycodeRegistry, LiteralKey};
pub use modifier::{BuiltinModifier, EventFlags, ModifierMask};

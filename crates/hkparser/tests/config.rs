//! End-to-end compilation of config text into hotkey tables.

use std::time::Duration;

use pretty_assertions::assert_eq;

use hkkeys::{
    Chord, CompiledTable, ConfigProperties, Hotkey, KeycodeRegistry, LiteralKey, ModifierMask,
};
use hkparser::{compile, CompileError, ConfigError};

fn compile_ok(source: &str) -> (CompiledTable, ConfigProperties) {
    let registry = KeycodeRegistry::ansi();
    compile(source, &registry).expect("config should compile")
}

fn compile_err(source: &str) -> ConfigError {
    let registry = KeycodeRegistry::ansi();
    compile(source, &registry).expect_err("config should be rejected")
}

fn single_chord(table: &CompiledTable, keycode: u32, modifiers: ModifierMask) -> Option<&str> {
    let hotkey = Hotkey {
        chords: [Chord::new(keycode, modifiers)].into_iter().collect(),
        ..Hotkey::default()
    };
    table.get(&hotkey).map(String::as_str)
}

#[test]
fn single_hotkey_compiles() {
    let (table, config) = compile_ok("cmd + q : echo bye\n");
    assert_eq!(table.len(), 1);
    assert_eq!(
        single_chord(&table, 0x0C, ModifierMask::CMD),
        Some("echo bye")
    );
    assert_eq!(config, ConfigProperties::default());
}

#[test]
fn config_properties_apply() {
    let (_, config) = compile_ok(
        "max_chord_interval = 1500\nhold_modifier_threshold = 250\nsimultaneous_threshold = 50\n",
    );
    assert_eq!(config.max_chord_interval, Duration::from_millis(1500));
    assert_eq!(config.hold_modifier_threshold, Duration::from_millis(250));
    assert_eq!(config.simultaneous_threshold, Duration::from_millis(50));
}

#[test]
fn unknown_property_is_rejected() {
    assert!(matches!(
        compile_err("chord_timeout = 10\n"),
        ConfigError::Compile(CompileError::UnknownProperty { .. })
    ));
}

#[test]
fn custom_modifier_resolves_through_aliases() {
    let source = "\
define_modifier hyper = cmd + ctrl + alt + shift
define_modifier mega = hyper + fn
mega + m : mega
";
    let (table, _) = compile_ok(source);
    let expected = ModifierMask::CMD
        | ModifierMask::CTRL
        | ModifierMask::ALT
        | ModifierMask::SHIFT
        | ModifierMask::FN;
    assert_eq!(single_chord(&table, 0x2E, expected), Some("mega"));
}

#[test]
fn cyclic_modifier_is_rejected() {
    let source = "\
define_modifier a1 = b1
define_modifier b1 = a1
a1 + x : boom
";
    assert!(matches!(
        compile_err(source),
        ConfigError::Compile(CompileError::CyclicModifier { .. })
    ));
}

#[test]
fn unknown_modifier_compiles_to_empty_mask() {
    // Unknown aliases warn but do not abort the load.
    let (table, _) = compile_ok("ghost + g : boo\n");
    assert_eq!(
        single_chord(&table, 0x05, ModifierMask::empty()),
        Some("boo")
    );
}

#[test]
fn implicit_fn_flag_for_function_and_navigation_keys() {
    let (table, _) = compile_ok("f1 : one\nleft : nav\nreturn : plain\n");
    let f1 = Hotkey {
        chords: [Chord::new(LiteralKey::F1.keycode(), ModifierMask::FN)]
            .into_iter()
            .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&f1).map(String::as_str), Some("one"));

    let left = Hotkey {
        chords: [Chord::new(LiteralKey::Left.keycode(), ModifierMask::FN)]
            .into_iter()
            .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&left).map(String::as_str), Some("nav"));

    let plain = Hotkey {
        chords: [Chord::new(LiteralKey::Return.keycode(), ModifierMask::empty())]
            .into_iter()
            .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&plain).map(String::as_str), Some("plain"));
}

#[test]
fn implicit_nx_flag_for_media_keys() {
    let (table, _) = compile_ok("mute : toggle-mute\n");
    let mute = Hotkey {
        chords: [Chord::new(LiteralKey::Mute.keycode(), ModifierMask::NX)]
            .into_iter()
            .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&mute).map(String::as_str), Some("toggle-mute"));
}

#[test]
fn brace_expansion_with_parallel_commands() {
    let (table, _) = compile_ok("ctrl + {1,2,3} : workspace {one,two,three}\n");
    assert_eq!(table.len(), 3);
    assert_eq!(
        single_chord(&table, 0x12, ModifierMask::CTRL),
        Some("workspace one")
    );
    assert_eq!(
        single_chord(&table, 0x13, ModifierMask::CTRL),
        Some("workspace two")
    );
    assert_eq!(
        single_chord(&table, 0x14, ModifierMask::CTRL),
        Some("workspace three")
    );
}

#[test]
fn brace_expansion_with_shared_command() {
    let (table, _) = compile_ok("ctrl + {a,b,c} : echo hi\n");
    assert_eq!(table.len(), 3);
    for keycode in [0x00, 0x0B, 0x08] {
        assert_eq!(
            single_chord(&table, keycode, ModifierMask::CTRL),
            Some("echo hi")
        );
    }
}

#[test]
fn mismatched_expansion_is_rejected() {
    assert!(matches!(
        compile_err("ctrl + {a,b} : echo {1,2,3}\n"),
        ConfigError::Compile(CompileError::MismatchedExpansion {
            keys: 2,
            commands: 3,
        })
    ));
}

#[test]
fn two_brace_chords_are_rejected() {
    assert!(matches!(
        compile_err("ctrl + {a,b} ; ctrl + {c,d} : x\n"),
        ConfigError::Compile(CompileError::TooManyBraceChords { .. })
    ));
}

#[test]
fn brace_expansion_in_a_sequence() {
    let (table, _) = compile_ok("ctrl + x ; ctrl + {a,b} : pick {first,second}\n");
    assert_eq!(table.len(), 2);

    let first = Hotkey {
        chords: [
            Chord::new(0x07, ModifierMask::CTRL),
            Chord::new(0x00, ModifierMask::CTRL),
        ]
        .into_iter()
        .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&first).map(String::as_str), Some("pick first"));
}

#[test]
fn sequences_compile_in_chord_order() {
    let (table, _) = compile_ok("ctrl + x ; ctrl + c : quit\n");
    let hotkey = Hotkey {
        chords: [
            Chord::new(0x07, ModifierMask::CTRL),
            Chord::new(0x08, ModifierMask::CTRL),
        ]
        .into_iter()
        .collect(),
        ..Hotkey::default()
    };
    assert_eq!(table.get(&hotkey).map(String::as_str), Some("quit"));
}

#[test]
fn flags_carry_into_the_compiled_hotkey() {
    let (table, _) = compile_ok("@ & ^ cmd + k : kick\n");
    let hotkey = Hotkey {
        chords: [Chord::new(0x28, ModifierMask::CMD)].into_iter().collect(),
        passthrough: true,
        repeat: true,
        on_release: true,
    };
    assert_eq!(table.get(&hotkey).map(String::as_str), Some("kick"));
}

#[test]
fn hex_keycode_is_used_verbatim() {
    let (table, _) = compile_ok("cmd + 0x32 : backtick\n");
    assert_eq!(
        single_chord(&table, 0x32, ModifierMask::CMD),
        Some("backtick")
    );
}

#[test]
fn missing_key_is_rejected() {
    assert!(matches!(
        compile_err("cmd + : nothing\n"),
        ConfigError::Compile(CompileError::MissingKey { .. })
    ));
}

#[test]
fn empty_command_compiles_to_empty_string() {
    let (table, _) = compile_ok("cmd + q :\n");
    assert_eq!(single_chord(&table, 0x0C, ModifierMask::CMD), Some(""));
}

#[test]
fn parse_errors_surface_as_config_errors() {
    assert!(matches!(
        compile_err("define_modifier oops\n"),
        ConfigError::Parse(_)
    ));
}

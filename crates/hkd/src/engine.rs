//! The event-driven matching engine.
//!
//! Single-threaded: the OS tap delivers events on its run-loop thread
//! and each call to [`Engine::handle`] runs to completion before the
//! next event arrives, so the sequence state needs no guarding. The
//! compiled table is swapped wholesale on reload.

use std::time::Instant;

use tracing::debug;

use hkkeys::{
    Chord, CompiledTable, ConfigProperties, Decision, KeyEvent, KeyEventKind, Keycode, ModifierMask,
};

/// Development escape hatch: right Alt plus keycode 8 tears the daemon
/// down regardless of the loaded config. Disabled unless explicitly
/// requested.
const EXIT_CHORD: Chord = Chord::new(8, ModifierMask::RALT);

/// Outcome of the sequence-matching step for one key-down.
enum SequenceOutcome {
    /// The chord completed a sequence; fire this command.
    Complete(String),
    /// The chord extended a prefix of at least one sequence.
    Prefix,
    /// No sequence starts this way.
    Miss,
}

/// Matches incoming key events against the compiled table.
pub struct Engine {
    table: CompiledTable,
    config: ConfigProperties,
    /// Prefix of a chord sequence matched so far.
    current_chords: Vec<Chord>,
    /// Time of the key-down that last extended `current_chords`.
    last_press_time: Option<Instant>,
    /// Keycode of the last fired key-down, cleared by its key-up.
    last_triggered: Option<Keycode>,
    exit_chord_enabled: bool,
    exit_requested: bool,
}

impl Engine {
    #[must_use]
    pub fn new(table: CompiledTable, config: ConfigProperties) -> Self {
        Engine {
            table,
            config,
            current_chords: Vec::new(),
            last_press_time: None,
            last_triggered: None,
            exit_chord_enabled: false,
            exit_requested: false,
        }
    }

    /// Arm the development exit chord.
    pub fn enable_exit_chord(&mut self) {
        self.exit_chord_enabled = true;
    }

    /// Whether the exit chord fired; the orchestrator polls this after
    /// each event.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Publish a freshly compiled table, dropping any in-flight
    /// sequence.
    pub fn swap_table(&mut self, table: CompiledTable, config: ConfigProperties) {
        self.table = table;
        self.config = config;
        self.reset_sequence();
    }

    /// Process one event against the wall clock.
    pub fn handle(&mut self, event: &KeyEvent, run: &mut dyn FnMut(&str)) -> Decision {
        self.handle_at(event, Instant::now(), run)
    }

    /// Process one event at an explicit instant.
    ///
    /// `run` is invoked at most once per call, with the command of the
    /// hotkey that fired.
    pub fn handle_at(
        &mut self,
        event: &KeyEvent,
        now: Instant,
        run: &mut dyn FnMut(&str),
    ) -> Decision {
        let current = event.chord();

        if self.exit_chord_enabled && EXIT_CHORD.is_activated_by(&current) {
            debug!("exit chord detected, requesting shutdown");
            self.exit_requested = true;
            return Decision::Consume;
        }

        if event.kind == KeyEventKind::Up && self.last_triggered == Some(event.keycode) {
            self.last_triggered = None;
        }

        if event.kind == KeyEventKind::Down && !event.is_autorepeat {
            match self.match_sequence(current, now) {
                SequenceOutcome::Complete(command) => {
                    if !command.is_empty() {
                        debug!("sequence complete, executing: {command}");
                        run(&command);
                    }
                    self.reset_sequence();
                    return Decision::Consume;
                }
                SequenceOutcome::Prefix => return Decision::Consume,
                SequenceOutcome::Miss => self.reset_sequence(),
            }
        }

        self.match_single(&current, event, run)
    }

    /// Steps 5a-5d: extend the current prefix and test it against the
    /// sequence hotkeys.
    fn match_sequence(&mut self, current: Chord, now: Instant) -> SequenceOutcome {
        if let Some(last) = self.last_press_time {
            if now.duration_since(last) > self.config.max_chord_interval {
                self.reset_sequence();
            }
        }

        self.current_chords.push(current);
        self.last_press_time = Some(now);

        for (hotkey, command) in &self.table {
            if !hotkey.is_sequence() || self.current_chords.len() > hotkey.chords.len() {
                continue;
            }

            let matches = self
                .current_chords
                .iter()
                .zip(&hotkey.chords)
                .all(|(observed, configured)| configured.is_activated_by(observed));
            if !matches {
                continue;
            }

            if self.current_chords.len() == hotkey.chords.len() {
                return SequenceOutcome::Complete(command.clone());
            }
            debug!("matched partial chord sequence");
            return SequenceOutcome::Prefix;
        }

        SequenceOutcome::Miss
    }

    /// Step 6: dispatch against the single-chord hotkeys; the first
    /// activated hotkey in table order decides.
    fn match_single(
        &mut self,
        current: &Chord,
        event: &KeyEvent,
        run: &mut dyn FnMut(&str),
    ) -> Decision {
        let mut fired: Option<(String, bool)> = None;
        let mut decision = None;

        for (hotkey, command) in &self.table {
            if hotkey.is_sequence() || !hotkey.chords[0].is_activated_by(current) {
                continue;
            }

            let flag_decision = if hotkey.passthrough {
                Decision::Passthrough
            } else {
                Decision::Consume
            };

            if hotkey.on_release {
                if event.kind == KeyEventKind::Down {
                    // The release will fire; the press flows through.
                    return Decision::Passthrough;
                }
                fired = Some((command.clone(), false));
            } else {
                match event.kind {
                    KeyEventKind::Down => {
                        if !event.is_autorepeat || hotkey.repeat {
                            fired = Some((command.clone(), true));
                        }
                        // A suppressed autorepeat is still consumed.
                    }
                    KeyEventKind::Up => {
                        // The matching key-up is swallowed silently.
                    }
                }
            }

            decision = Some(flag_decision);
            break;
        }

        let Some(decision) = decision else {
            return Decision::Passthrough;
        };

        if let Some((command, is_down)) = fired {
            if !command.is_empty() {
                debug!("executing command: {command}");
                run(&command);
            }
            if is_down {
                self.last_triggered = Some(event.keycode);
            }
        }

        decision
    }

    fn reset_sequence(&mut self) {
        self.current_chords.clear();
        self.last_press_time = None;
    }
}

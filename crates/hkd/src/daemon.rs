//! The orchestrator: wires config loading to the matching engine and
//! owns reload.

use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use hkkeys::{CompiledTable, ConfigProperties, Decision, KeyEvent, KeycodeRegistry};
use hkparser::ConfigError;

use crate::engine::Engine;
use crate::shell;

/// Failure to read or compile the config file.
#[derive(Debug, derive_more::From)]
pub enum LoadError {
    Io(io::Error),
    Config(ConfigError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read config file: {err}"),
            LoadError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Config(err) => Some(err),
        }
    }
}

/// Owns the engine and its config lifecycle; the OS tap invokes
/// [`Daemon::on_event`] for every keyboard event.
pub struct Daemon {
    engine: Engine,
    registry: KeycodeRegistry,
    config_path: PathBuf,
    reload_requested: Arc<AtomicBool>,
}

impl Daemon {
    /// Load the config and build the engine.
    ///
    /// # Errors
    ///
    /// Return a [`LoadError`] when the initial config cannot be read or
    /// compiled; unlike reloads, startup has no previous table to fall
    /// back to.
    pub fn new(config_path: PathBuf, registry: KeycodeRegistry) -> Result<Self, LoadError> {
        let (table, config) = load(&config_path, &registry)?;
        info!(
            "loaded {} hotkeys from {}",
            table.len(),
            config_path.display()
        );

        Ok(Daemon {
            engine: Engine::new(table, config),
            registry,
            config_path,
            reload_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag a signal handler can set to request a reload; picked up
    /// before the next event is dispatched.
    #[must_use]
    pub fn reload_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.reload_requested)
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Whether the engine's exit chord fired.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.engine.exit_requested()
    }

    /// Rebuild the table from the config file and swap it in,
    /// clearing any in-flight sequence. A failed reload keeps the
    /// previous table.
    pub fn reload(&mut self) {
        match load(&self.config_path, &self.registry) {
            Ok((table, config)) => {
                info!(
                    "reloaded {} hotkeys from {}",
                    table.len(),
                    self.config_path.display()
                );
                self.engine.swap_table(table, config);
            }
            Err(err) => warn!("reload failed, keeping previous config: {err}"),
        }
    }

    /// The callback the OS event tap drives.
    pub fn on_event(&mut self, event: &KeyEvent) -> Decision {
        if self.reload_requested.swap(false, Ordering::AcqRel) {
            self.reload();
        }
        self.engine.handle(event, &mut shell::spawn_detached)
    }
}

fn load(
    path: &std::path::Path,
    registry: &KeycodeRegistry,
) -> Result<(CompiledTable, ConfigProperties), LoadError> {
    let contents = fs::read_to_string(path)?;
    let compiled = hkparser::compile(&contents, registry)?;
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hkkeys::EventFlags;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempdir::TempDirGuard, PathBuf) {
        let dir = tempdir::create();
        let path = dir.path().join("hkdrc");
        let mut file = fs::File::create(&path).expect("create config");
        file.write_all(contents.as_bytes()).expect("write config");
        (dir, path)
    }

    /// Minimal scoped temp dir so the tests need no extra crates.
    mod tempdir {
        use std::path::{Path, PathBuf};
        use std::sync::atomic::{AtomicU32, Ordering};

        static COUNTER: AtomicU32 = AtomicU32::new(0);

        pub struct TempDirGuard(PathBuf);

        impl TempDirGuard {
            pub fn path(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempDirGuard {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }

        pub fn create() -> TempDirGuard {
            let unique = format!(
                "hkd-test-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            );
            let dir = std::env::temp_dir().join(unique);
            std::fs::create_dir_all(&dir).expect("create temp dir");
            TempDirGuard(dir)
        }
    }

    #[test]
    fn loads_config_and_dispatches() {
        let (_guard, path) = write_config("cmd + q : echo bye\n");
        let mut daemon = Daemon::new(path, KeycodeRegistry::ansi()).expect("daemon");

        let event = KeyEvent::down(0x0C, EventFlags::CMD);
        assert_eq!(daemon.on_event(&event), Decision::Consume);
    }

    #[test]
    fn startup_fails_on_bad_config() {
        let (_guard, path) = write_config("define_modifier broken\n");
        assert!(Daemon::new(path, KeycodeRegistry::ansi()).is_err());
    }

    #[test]
    fn reload_keeps_previous_table_on_error() {
        let (_guard, path) = write_config("cmd + q : echo bye\n");
        let mut daemon = Daemon::new(path.clone(), KeycodeRegistry::ansi()).expect("daemon");

        fs::write(&path, "define_modifier broken\n").expect("rewrite config");
        daemon.reload();

        // The original binding still dispatches.
        let event = KeyEvent::down(0x0C, EventFlags::CMD);
        assert_eq!(daemon.on_event(&event), Decision::Consume);
    }

    #[test]
    fn reload_flag_swaps_table_before_dispatch() {
        let (_guard, path) = write_config("cmd + q : echo bye\n");
        let mut daemon = Daemon::new(path.clone(), KeycodeRegistry::ansi()).expect("daemon");
        let flag = daemon.reload_flag();

        fs::write(&path, "cmd + w : echo hi\n").expect("rewrite config");
        flag.store(true, Ordering::Release);

        // Old binding is gone, new one dispatches.
        assert_eq!(
            daemon.on_event(&KeyEvent::down(0x0C, EventFlags::CMD)),
            Decision::Passthrough
        );
        assert_eq!(
            daemon.on_event(&KeyEvent::down(0x0D, EventFlags::CMD)),
            Decision::Consume
        );
    }
}

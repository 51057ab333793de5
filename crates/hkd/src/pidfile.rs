//! Single-instance pid file under `/tmp`, held with an exclusive lock
//! for the daemon's lifetime.

use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

use nix::fcntl::{Flock, FlockArg};
use tracing::debug;

fn pid_file_path() -> Result<String, PidFileError> {
    let user = std::env::var("USER").map_err(|_| PidFileError::MissingUser)?;
    Ok(format!("/tmp/hkd_{user}.pid"))
}

/// Failure to create, lock or read the pid file.
#[derive(Debug)]
pub enum PidFileError {
    /// `USER` is not set, so the pid file path cannot be built.
    MissingUser,
    Io(io::Error),
    /// Another instance already holds the lock.
    AlreadyRunning,
    /// No instance holds the lock, so there is no daemon to signal.
    NotRunning,
    /// The file contents are not a pid.
    Malformed,
}

impl Display for PidFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidFileError::MissingUser => {
                write!(f, "could not build pid file path: USER is not set")
            }
            PidFileError::Io(err) => write!(f, "pid file error: {err}"),
            PidFileError::AlreadyRunning => {
                write!(f, "another instance already holds the pid file lock")
            }
            PidFileError::NotRunning => write!(f, "no running instance found"),
            PidFileError::Malformed => write!(f, "pid file contents are not a pid"),
        }
    }
}

impl std::error::Error for PidFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PidFileError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PidFileError {
    fn from(err: io::Error) -> Self {
        PidFileError::Io(err)
    }
}

/// The held pid file; dropping it releases the lock.
pub struct PidFile {
    _lock: Flock<File>,
}

/// Write this process's pid and take the exclusive lock.
///
/// # Errors
///
/// Return [`PidFileError::AlreadyRunning`] when another instance holds
/// the lock, or an I/O error.
pub fn create() -> Result<PidFile, PidFileError> {
    let path = pid_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)?;

    let mut lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => lock,
        Err((_, _)) => return Err(PidFileError::AlreadyRunning),
    };

    lock.set_len(0)?;
    write!(lock, "{}", std::process::id())?;
    lock.flush()?;

    debug!("created pid file at {path}");
    Ok(PidFile { _lock: lock })
}

/// Read the pid of the running instance.
///
/// The lock probe doubles as a liveness check: if the exclusive lock
/// succeeds, nothing holds the file and no daemon is running.
///
/// # Errors
///
/// Return [`PidFileError::NotRunning`] when no instance holds the
/// lock, [`PidFileError::Malformed`] for unparsable contents, or an
/// I/O error.
pub fn read() -> Result<i32, PidFileError> {
    let path = pid_file_path()?;
    let file = OpenOptions::new().read(true).open(&path)?;

    let mut file = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(_) => return Err(PidFileError::NotRunning),
        Err((file, _)) => file,
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    contents.trim().parse().map_err(|_| PidFileError::Malformed)
}

//! The OS keyboard event tap seam.
//!
//! The engine is OS-agnostic; anything that can feed it [`KeyEvent`]s
//! and honour [`Decision`]s qualifies as a tap. The only production
//! backend is the macOS CGEventTap.

use std::fmt::{self, Display};

use hkkeys::{Decision, KeyEvent};

#[cfg(target_os = "macos")]
mod macos;

/// Failure to create or drive an event tap.
#[derive(Debug)]
pub enum TapError {
    /// No tap backend exists for this platform.
    Unsupported,
    /// The OS refused to create the tap, typically for lack of
    /// accessibility permissions.
    CreateFailed,
}

impl Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapError::Unsupported => {
                write!(f, "no keyboard event tap backend for this platform")
            }
            TapError::CreateFailed => write!(
                f,
                "failed to create event tap (is accessibility access granted?)"
            ),
        }
    }
}

impl std::error::Error for TapError {}

/// A source of keyboard events.
///
/// `run` blocks, invoking the handler for every event in delivery
/// order. The handler's [`Decision`] controls whether the OS keeps
/// delivering the event to the focused application.
pub trait EventTap {
    /// Drive the event loop until the tap is torn down.
    ///
    /// # Errors
    ///
    /// Return a [`TapError`] when the tap cannot be created or dies.
    fn run(&mut self, handler: &mut dyn FnMut(&KeyEvent) -> Decision) -> Result<(), TapError>;
}

/// The platform's keyboard tap.
///
/// # Errors
///
/// Return [`TapError::Unsupported`] on platforms without a backend.
pub fn system_tap() -> Result<Box<dyn EventTap>, TapError> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(macos::CgEventTap::new()))
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(TapError::Unsupported)
    }
}

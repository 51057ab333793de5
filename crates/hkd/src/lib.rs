#![warn(clippy::pedantic)]

//! Hotkey daemon: matches system-wide keyboard events against a
//! user-defined table compiled by [`hkparser`] and spawns the bound
//! shell commands.

pub mod daemon;
pub mod engine;
pub mod observe;
pub mod paths;
pub mod pidfile;
pub mod service;
pub mod shell;
pub mod tap;

pub use daemon::{Daemon, LoadError};
pub use engine::Engine;
pub use tap::{EventTap, TapError};

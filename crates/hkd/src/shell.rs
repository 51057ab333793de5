//! Fire-and-forget shell command execution.

use std::process::{Command, Stdio};

use tracing::debug;

/// Spawn `command` under `/bin/sh -c` in its own process group and
/// return immediately.
///
/// The engine never learns the outcome: spawn failures are logged and
/// dropped, and the child is never waited on (the daemon ignores
/// `SIGCHLD` so finished children do not linger).
pub fn spawn_detached(command: &str) {
    let mut child = Command::new("/bin/sh");
    child
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        child.process_group(0);
    }

    match child.spawn() {
        Ok(child) => debug!("spawned '{command}' as pid {}", child.id()),
        Err(err) => debug!("failed to spawn '{command}': {err}"),
    }
}

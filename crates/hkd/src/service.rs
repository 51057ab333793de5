//! launchd service management: plist generation and `launchctl`
//! plumbing for the install/start/stop lifecycle.

use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::info;

const LAUNCHCTL_PATH: &str = "/bin/launchctl";

const PLIST_NAME: &str = "com.hkd.daemon";

fn plist_contents(exe_path: &str, path_env: &str, user: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{PLIST_NAME}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe_path}</string>
    </array>
    <key>EnvironmentVariables</key>
    <dict>
        <key>PATH</key>
        <string>{path_env}</string>
    </dict>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <dict>
        <key>SuccessfulExit</key>
        <false/>
        <key>Crashed</key>
        <true/>
    </dict>
    <key>StandardOutPath</key>
    <string>/tmp/hkd_{user}.out.log</string>
    <key>StandardErrorPath</key>
    <string>/tmp/hkd_{user}.err.log</string>
    <key>ProcessType</key>
    <string>Interactive</string>
    <key>Nice</key>
    <integer>-20</integer>
</dict>
</plist>"#
    )
}

/// Failure in the launchd management commands.
#[derive(Debug)]
pub enum ServiceError {
    AlreadyInstalled(PathBuf),
    NotInstalled(PathBuf),
    MissingEnv(&'static str),
    Io(io::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::AlreadyInstalled(path) => {
                write!(f, "service file '{}' is already installed", path.display())
            }
            ServiceError::NotInstalled(path) => {
                write!(f, "service file '{}' is not installed", path.display())
            }
            ServiceError::MissingEnv(var) => {
                write!(f, "{var} environment variable not set")
            }
            ServiceError::Io(err) => write!(f, "service management failed: {err}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ServiceError {
    fn from(err: io::Error) -> Self {
        ServiceError::Io(err)
    }
}

fn env_var(name: &'static str) -> Result<String, ServiceError> {
    std::env::var(name).map_err(|_| ServiceError::MissingEnv(name))
}

fn plist_path() -> Result<PathBuf, ServiceError> {
    let home = env_var("HOME")?;
    Ok(PathBuf::from(home)
        .join("Library/LaunchAgents")
        .join(format!("{PLIST_NAME}.plist")))
}

fn domain_target() -> String {
    format!("gui/{}", nix::unistd::getuid())
}

fn service_target() -> String {
    format!("gui/{}/{}", nix::unistd::getuid(), PLIST_NAME)
}

fn launchctl_exec(args: &[&str], suppress_output: bool) -> Result<i32, ServiceError> {
    let mut command = Command::new(LAUNCHCTL_PATH);
    command.args(args);
    if suppress_output {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    let status = command.status()?;
    Ok(status.code().unwrap_or(1))
}

fn is_bootstrapped() -> Result<bool, ServiceError> {
    Ok(launchctl_exec(&["blame", &service_target()], true)? == 0)
}

/// Write the launch agent plist.
///
/// # Errors
///
/// Return an error when the plist already exists or cannot be written.
pub fn install() -> Result<(), ServiceError> {
    let path = plist_path()?;
    if path.exists() {
        return Err(ServiceError::AlreadyInstalled(path));
    }

    let exe = std::env::current_exe()?;
    let path_env = env_var("PATH")?;
    let user = env_var("USER")?;
    let contents = plist_contents(&exe.to_string_lossy(), &path_env, &user);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(())
}

/// Remove the launch agent plist.
///
/// # Errors
///
/// Return an error when the plist is missing or cannot be removed.
pub fn uninstall() -> Result<(), ServiceError> {
    let path = plist_path()?;
    if !path.exists() {
        return Err(ServiceError::NotInstalled(path));
    }
    fs::remove_file(&path)?;
    Ok(())
}

/// Bootstrap (or kickstart) the service, installing the plist first if
/// needed.
///
/// # Errors
///
/// Return an error when installation or `launchctl` fails.
pub fn start() -> Result<(), ServiceError> {
    let path = plist_path()?;
    if !path.exists() {
        info!("service file '{}' does not exist, installing", path.display());
        install()?;
    }

    let service = service_target();
    let domain = domain_target();
    let plist = path.to_string_lossy().into_owned();

    if is_bootstrapped()? {
        launchctl_exec(&["kickstart", &service], true)?;
    } else {
        launchctl_exec(&["enable", &service], true)?;
        launchctl_exec(&["bootstrap", &domain, &plist], true)?;
    }
    Ok(())
}

/// Restart the running service.
///
/// # Errors
///
/// Return an error when the plist is missing or `launchctl` fails.
pub fn restart() -> Result<(), ServiceError> {
    let path = plist_path()?;
    if !path.exists() {
        return Err(ServiceError::NotInstalled(path));
    }
    launchctl_exec(&["kickstart", "-k", &service_target()], false)?;
    Ok(())
}

/// Stop the service, booting it out of the session when bootstrapped.
///
/// # Errors
///
/// Return an error when the plist is missing or `launchctl` fails.
pub fn stop() -> Result<(), ServiceError> {
    let path = plist_path()?;
    if !path.exists() {
        return Err(ServiceError::NotInstalled(path));
    }

    let service = service_target();
    let domain = domain_target();
    let plist = path.to_string_lossy().into_owned();

    if is_bootstrapped()? {
        launchctl_exec(&["bootout", &domain, &plist], true)?;
        launchctl_exec(&["disable", &service], true)?;
    } else {
        launchctl_exec(&["kill", "SIGTERM", &service], true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plist_carries_label_and_paths() {
        let contents = plist_contents("/usr/local/bin/hkd", "/usr/bin:/bin", "me");
        assert!(contents.contains("<string>com.hkd.daemon</string>"));
        assert!(contents.contains("<string>/usr/local/bin/hkd</string>"));
        assert!(contents.contains("<string>/usr/bin:/bin</string>"));
        assert!(contents.contains("/tmp/hkd_me.out.log"));
        assert!(contents.contains("/tmp/hkd_me.err.log"));
    }
}

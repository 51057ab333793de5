//! Config file discovery.

use std::path::PathBuf;

const CONFIG_DIR: &str = "hkd";
const CONFIG_FILE: &str = "hkdrc";

/// Locate the config file, checking in order:
/// `$XDG_CONFIG_HOME/hkd/hkdrc`, `~/.config/hkd/hkdrc`,
/// `~/.hkd/hkdrc`.
#[must_use]
pub fn config_file() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            let path = PathBuf::from(xdg).join(CONFIG_DIR).join(CONFIG_FILE);
            if path.is_file() {
                return Some(path);
            }
        }
    }

    let home = std::env::var_os("HOME").filter(|home| !home.is_empty())?;
    let home = PathBuf::from(home);

    let path = home.join(".config").join(CONFIG_DIR).join(CONFIG_FILE);
    if path.is_file() {
        return Some(path);
    }

    let path = home.join(format!(".{CONFIG_DIR}")).join(CONFIG_FILE);
    if path.is_file() {
        return Some(path);
    }

    None
}

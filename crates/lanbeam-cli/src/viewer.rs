/// Hand a received file to the platform's default opener. Launch failure is
/// logged and otherwise ignored; it never affects the session result.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

pub fn open_saved(path: &Path) {
    match open_command(path).spawn() {
        Ok(_) => info!(path = %path.display(), "opened in default viewer"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not launch a viewer"),
    }
}

#[cfg(target_os = "macos")]
fn open_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn open_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn open_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

use std::{io, process::Stdio};

use htmldisplay_core::{WindowMode, WindowSize};
use tokio::process::Command;

#[cfg(target_os = "windows")]
const POPUP_BROWSERS: &[&str] = &["chrome", "msedge"];

#[cfg(not(target_os = "windows"))]
const POPUP_BROWSERS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "microsoft-edge",
];

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no chromium based browser found")]
    BrowserNotFound,
    #[error("failed to launch {browser}: {source}")]
    Spawn {
        browser: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open default browser: {0}")]
    DefaultBrowser(#[source] io::Error),
}

/// Opens preview URLs in a browser.
pub trait WindowLauncher: Send + Sync {
    /// Open `url` in a chromeless app window of the given size.
    fn open_popup(&self, url: &str, size: WindowSize) -> Result<(), LaunchError>;

    /// Open `url` with the system default browser.
    fn open_default(&self, url: &str) -> Result<(), LaunchError>;
}

/// Open `url` the way `mode` asks for.
///
/// macOS always uses the default browser. A failed launch is retried once
/// with the default browser; failures are logged and never returned.
pub fn open_window(launcher: &dyn WindowLauncher, url: &str, mode: WindowMode, size: WindowSize) {
    let result = if mode == WindowMode::Popup && !cfg!(target_os = "macos") {
        launcher.open_popup(url, size)
    } else {
        launcher.open_default(url)
    };

    let Err(error) = result else {
        return;
    };

    tracing::warn!("failed to open preview window, falling back to default browser: {error}");

    if let Err(error) = launcher.open_default(url) {
        tracing::error!("fallback browser launch failed: {error}");
    }
}

/// Launches real browser processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl WindowLauncher for SystemLauncher {
    fn open_popup(&self, url: &str, size: WindowSize) -> Result<(), LaunchError> {
        let app = format!("--app={url}");
        let window_size = format!("--window-size={},{}", size.width, size.height);

        for &browser in POPUP_BROWSERS {
            match popup_command(browser, &app, &window_size).spawn() {
                Ok(_) => {
                    tracing::info!("opened {url} in {browser}");
                    return Ok(());
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(LaunchError::Spawn {
                        browser: browser.to_owned(),
                        source,
                    });
                }
            }
        }

        Err(LaunchError::BrowserNotFound)
    }

    fn open_default(&self, url: &str) -> Result<(), LaunchError> {
        open::that_detached(url).map_err(LaunchError::DefaultBrowser)?;
        tracing::info!("opened {url} in default browser");
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn popup_command(browser: &str, app: &str, window_size: &str) -> Command {
    // `start` resolves browsers registered under App Paths, which are rarely on PATH.
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", browser, app, window_size]);
    detach(command)
}

#[cfg(not(target_os = "windows"))]
fn popup_command(browser: &str, app: &str, window_size: &str) -> Command {
    let mut command = Command::new(browser);
    command.args([app, window_size]);
    detach(command)
}

fn detach(mut command: Command) -> Command {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);
    command
}

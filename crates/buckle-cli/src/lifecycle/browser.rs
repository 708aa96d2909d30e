//! Opens the server's address in the user's browser.

use std::io;
use std::process::{Command, Stdio};
use std::thread;

use url::Url;

/// Launches a browser for a URL.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait BrowserOpener {
    fn open(&self, url: &Url) -> io::Result<()>;
}

/// Delegates to the platform's URL handler.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &Url) -> io::Result<()> {
        let mut child = opener_command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // Reap the opener in the background so it does not linger as a zombie.
        thread::spawn(move || child.wait());
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &Url) -> Command {
    let mut command = Command::new("open");
    command.arg(url.as_str());
    command
}

#[cfg(windows)]
fn opener_command(url: &Url) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(url.as_str());
    command
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(url: &Url) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url.as_str());
    command
}

//! Shell scripts standing in for the `buckle-server` binary.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// A directory of executable fake servers plus a scratch area they can write
/// markers into.
pub(crate) struct FakeServers {
    dir: TempDir,
}

impl FakeServers {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create fake server dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the marker file a script created with
    /// [`FakeServers::recording_env`] writes to.
    pub fn marker(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.env"))
    }

    /// Waits for the marker named `name` and returns its lines.
    pub fn read_marker(&self, name: &str) -> Vec<String> {
        let marker = self.marker(name);
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(content) = fs::read_to_string(&marker)
                && content.ends_with('\n')
            {
                return content.lines().map(str::to_owned).collect();
            }
            assert!(
                Instant::now() < deadline,
                "marker {} never appeared",
                marker.display()
            );
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// Whether the marker named `name` has been written.
    pub fn marker_exists(&self, name: &str) -> bool {
        self.marker(name).exists()
    }

    /// A server that stays up until signalled.
    pub fn long_running(&self) -> PathBuf {
        self.script("long-running", "exec sleep 30\n")
    }

    /// A server that exits immediately with `code`.
    pub fn exiting(&self, code: i32) -> PathBuf {
        self.script(&format!("exit-{code}"), &format!("exit {code}\n"))
    }

    /// A server that runs for about a second and then exits with `code`.
    pub fn short_lived(&self, code: i32) -> PathBuf {
        self.script(
            &format!("short-lived-{code}"),
            &format!("sleep 1\nexit {code}\n"),
        )
    }

    /// A server that writes its `PORT` and `CONFIG_PATH` to a marker file and
    /// then stays up.
    pub fn recording_env(&self, name: &str) -> PathBuf {
        let marker = self.marker(name);
        let body = format!(
            "printf '%s\\n%s\\n' \"$PORT\" \"$CONFIG_PATH\" > '{}'\nexec sleep 30\n",
            marker.display()
        );
        self.script(name, &body)
    }

    /// A server that writes its `PORT` and `CONFIG_PATH` to a marker file and
    /// exits successfully.
    pub fn recording_env_and_exiting(&self, name: &str) -> PathBuf {
        let marker = self.marker(name);
        let body = format!(
            "printf '%s\\n%s\\n' \"$PORT\" \"$CONFIG_PATH\" > '{}'\nexit 0\n",
            marker.display()
        );
        self.script(name, &body)
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write fake server");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("mark fake server executable");
        path
    }
}

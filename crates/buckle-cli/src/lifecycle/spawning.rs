//! Server process spawning utilities.
//!
//! Resolves the server binary and launches it with the port and configuration
//! path passed through the environment. Standard output and error are
//! inherited so the server's output appears in the launcher's terminal.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::error::LifecycleError;
use super::types::LaunchConfig;

/// File name of the server binary expected next to the launcher.
pub(crate) const SERVER_BINARY_NAME: &str = "buckle-server";

/// Environment variable carrying the listening port.
pub(crate) const PORT_ENV: &str = "PORT";

/// Environment variable carrying the server configuration path.
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Spawns the server described by `launch`.
///
/// The child inherits the launcher's environment plus `PORT` and
/// `CONFIG_PATH`. A spawn failure means no process exists.
pub(crate) fn spawn_server(launch: &LaunchConfig) -> Result<Child, LifecycleError> {
    let mut command = Command::new(&launch.binary_path);
    command
        .env(PORT_ENV, launch.port.get().to_string())
        .env(CONFIG_PATH_ENV, &launch.config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
        .spawn()
        .map_err(|source| LifecycleError::SpawnFailed {
            binary: launch.binary_path.clone(),
            source,
        })
}

/// Picks the server binary: an explicit, non-empty override wins, otherwise
/// `buckle-server` beside the running executable.
pub(crate) fn resolve_server_binary(
    binary_override: Option<&Path>,
) -> Result<PathBuf, LifecycleError> {
    if let Some(binary) = binary_override.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(binary.to_path_buf());
    }
    let executable = env::current_exe().map_err(|source| LifecycleError::ResolveBinary { source })?;
    Ok(sibling_binary(&executable))
}

fn sibling_binary(executable: &Path) -> PathBuf {
    executable
        .parent()
        .map_or_else(|| PathBuf::from(SERVER_BINARY_NAME), |dir| {
            dir.join(SERVER_BINARY_NAME)
        })
}

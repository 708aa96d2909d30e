//! Derives the state directory layout shared by the launcher commands.
//!
//! The state directory houses the PID record of the supervised server and the
//! log file reserved for output redirection. `up` writes the record and
//! `status` reads it, so both go through [`StatePaths`] rather than building
//! paths themselves.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// File name of the PID record inside the state directory.
pub const PID_FILE_NAME: &str = "buckle.pid";

/// File name of the reserved log file inside the state directory.
pub const LOG_FILE_NAME: &str = "buckle.log";

/// Canonical paths for the launcher's runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    state_dir: PathBuf,
    pid_path: PathBuf,
    log_path: PathBuf,
}

impl StatePaths {
    /// Derives state paths from the configuration.
    ///
    /// Relative state directories are anchored at the current working
    /// directory so diagnostics always report absolute locations. The
    /// directory itself is not created here.
    pub fn from_config(config: &Config) -> Result<Self, StatePathsError> {
        let configured = config.state_dir();
        if configured.as_os_str().is_empty() {
            return Err(StatePathsError::EmptyStateDir);
        }
        if configured.is_absolute() {
            return Ok(Self::new(configured));
        }
        let cwd = env::current_dir().map_err(|source| StatePathsError::WorkingDirectory { source })?;
        Ok(Self::new(cwd.join(configured)))
    }

    /// Builds the layout rooted at `state_dir`.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            pid_path: state_dir.join(PID_FILE_NAME),
            log_path: state_dir.join(LOG_FILE_NAME),
            state_dir,
        }
    }

    /// Directory holding runtime state.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.state_dir.as_path()
    }

    /// Path to the PID record.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path reserved for server log output.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.log_path.as_path()
    }
}

/// Errors raised while deriving state paths.
#[derive(Debug, Error)]
pub enum StatePathsError {
    /// The configured state directory was an empty path.
    #[error("state directory must not be empty")]
    EmptyStateDir,
    /// The working directory could not be resolved.
    #[error("failed to resolve working directory: {source}")]
    WorkingDirectory {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

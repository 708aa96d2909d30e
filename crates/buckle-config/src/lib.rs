//! Shared configuration for the Buckle launcher.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults are overridden by
//! an optional configuration file (`--config-path` or `BUCKLE_CONFIG_PATH`),
//! then by `BUCKLE_*` environment variables, and finally by command-line
//! flags. The launcher constructs a `Config` once at start-up and hands it to
//! the lifecycle supervisor by reference; nothing here is global or mutable.
//!
//! [`StatePaths`] derives the on-disk layout of the state directory so the
//! supervisor and the `status` command agree on where the PID record lives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod state;
mod timing;

pub use defaults::{
    DEFAULT_HEALTH_HOST, DEFAULT_HEALTH_PATH, DEFAULT_HEALTH_POLL_INTERVAL_MS,
    DEFAULT_HEALTH_REQUEST_TIMEOUT_MS, DEFAULT_HEALTH_TIMEOUT_MS, DEFAULT_LOG_FILTER,
    DEFAULT_STATE_DIR, default_health_host, default_health_path, default_log_filter,
    default_log_filter_string, default_log_format, default_state_dir,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use state::{LOG_FILE_NAME, PID_FILE_NAME, StatePaths, StatePathsError};
pub use timing::HealthTimingError;

/// Launcher configuration resolved from defaults, files, environment, and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BUCKLE")]
pub struct Config {
    /// Directory holding the PID record and the reserved log file.
    #[ortho_config(default = default_state_dir())]
    pub state_dir: PathBuf,
    /// Explicit server binary, bypassing discovery next to the CLI.
    pub server_bin: Option<PathBuf>,
    /// Host used when probing the server's health endpoint.
    #[ortho_config(default = default_health_host())]
    pub health_host: String,
    /// Request path of the server's health endpoint.
    #[ortho_config(default = default_health_path())]
    pub health_path: String,
    /// Overall readiness budget in milliseconds.
    #[ortho_config(default = DEFAULT_HEALTH_TIMEOUT_MS)]
    pub health_timeout_ms: u64,
    /// Upper bound for a single health probe in milliseconds.
    #[ortho_config(default = DEFAULT_HEALTH_REQUEST_TIMEOUT_MS)]
    pub health_request_timeout_ms: u64,
    /// Fixed delay between failed health probes in milliseconds.
    #[ortho_config(default = DEFAULT_HEALTH_POLL_INTERVAL_MS)]
    pub health_poll_interval_ms: u64,
    /// `tracing` filter expression for launcher diagnostics.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for launcher diagnostics.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            server_bin: None,
            health_host: default_health_host(),
            health_path: default_health_path(),
            health_timeout_ms: DEFAULT_HEALTH_TIMEOUT_MS,
            health_request_timeout_ms: DEFAULT_HEALTH_REQUEST_TIMEOUT_MS,
            health_poll_interval_ms: DEFAULT_HEALTH_POLL_INTERVAL_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory holding the launcher's runtime state.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.state_dir.as_path()
    }

    /// Server binary override, when configured.
    #[must_use]
    pub fn server_bin(&self) -> Option<&Path> {
        self.server_bin.as_deref()
    }

    /// Host name used for health probes.
    #[must_use]
    pub fn health_host(&self) -> &str {
        &self.health_host
    }

    /// Path of the health endpoint.
    #[must_use]
    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    /// Overall readiness budget.
    #[must_use]
    pub const fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Per-probe request timeout.
    #[must_use]
    pub const fn health_request_timeout(&self) -> Duration {
        Duration::from_millis(self.health_request_timeout_ms)
    }

    /// Delay between failed probes.
    #[must_use]
    pub const fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

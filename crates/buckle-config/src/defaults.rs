use std::path::PathBuf;

/// State directory used when none is configured, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".buckle";

/// Host probed for server health.
pub const DEFAULT_HEALTH_HOST: &str = "localhost";

/// Health endpoint exposed by the server.
pub const DEFAULT_HEALTH_PATH: &str = "/api/health";

/// Overall readiness budget in milliseconds.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 10_000;

/// Per-probe request timeout in milliseconds.
pub const DEFAULT_HEALTH_REQUEST_TIMEOUT_MS: u64 = 2_000;

/// Delay between failed probes in milliseconds.
pub const DEFAULT_HEALTH_POLL_INTERVAL_MS: u64 = 200;

/// Default log filter expression used by the launcher.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default state directory.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

/// Default health host as an owned value.
#[must_use]
pub fn default_health_host() -> String {
    DEFAULT_HEALTH_HOST.to_owned()
}

/// Default health path as an owned value.
#[must_use]
pub fn default_health_path() -> String {
    DEFAULT_HEALTH_PATH.to_owned()
}

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the launcher.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

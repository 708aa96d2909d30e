//! Error types for server lifecycle operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use buckle_config::StatePathsError;
use nix::errno::Errno;
use thiserror::Error;

/// Errors raised while reading or writing the PID record.
#[derive(Debug, Error)]
pub(crate) enum StateError {
    #[error("failed to create state directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read pid file {path:?}: {source}")]
    ReadRecord {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pid file {path:?} does not hold a process id: {content:?}")]
    CorruptRecord { path: PathBuf, content: String },
    #[error("failed to write pid file {path:?}: {source}")]
    WriteRecord {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove pid file {path:?}: {source}")]
    RemoveRecord {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// When the supervised server exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitStage {
    /// While the supervisor was still waiting for the health endpoint.
    Startup,
    /// After start-up, during the attached run.
    Running,
}

impl fmt::Display for ExitStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => formatter.write_str("before becoming healthy"),
            Self::Running => formatter.write_str("with failure"),
        }
    }
}

/// Errors raised while executing lifecycle commands.
#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    #[error("buckle is already running (process: {pid}); stop it before starting another instance")]
    AlreadyRunning { pid: u32 },
    #[error("detached mode is not supported; run 'buckle up' without --detach")]
    DetachedUnsupported,
    #[error("failed to resolve the buckle-server binary: {source}")]
    ResolveBinary {
        #[source]
        source: io::Error,
    },
    #[error("failed to start server binary {binary:?}: {source}")]
    SpawnFailed {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("server exited {stage} (status: {status:?})")]
    ServerExited {
        stage: ExitStage,
        status: Option<i32>,
    },
    #[error("interrupted while waiting for the server to become healthy")]
    Interrupted,
    #[error("failed to monitor server process: {source}")]
    MonitorChild {
        #[source]
        source: io::Error,
    },
    #[error("failed to signal server process {pid}: {source}")]
    SignalFailed {
        pid: u32,
        #[source]
        source: Errno,
    },
    #[error("failed to install signal handlers: {source}")]
    SignalInstall {
        #[source]
        source: io::Error,
    },
    #[error("failed to build health check client: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid health check address {address:?}: {source}")]
    HealthUrl {
        address: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Paths(#[from] StatePathsError),
    #[error("failed to write lifecycle output: {0}")]
    Io(#[source] io::Error),
}

//! Error types and exit codes for the CLI runtime.

use std::process::ExitCode;
use std::sync::Arc;

use buckle_config::HealthTimingError;
use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::telemetry::TelemetryError;

/// Incorrect invocation or invalid configuration.
pub(crate) const EXIT_USAGE: u8 = 1;
/// A live server is already recorded in the state directory.
pub(crate) const EXIT_ALREADY_RUNNING: u8 = 2;
/// The server could not be started or kept running.
pub(crate) const EXIT_START_FAILED: u8 = 3;
/// Interrupted while waiting for the server to become healthy.
pub(crate) const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] HealthTimingError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("{0}")]
    Lifecycle(#[from] LifecycleError),
}

impl AppError {
    pub(crate) fn exit_code(&self) -> ExitCode {
        let code = match self {
            Self::LoadConfiguration(_)
            | Self::CliUsage(_)
            | Self::InvalidConfiguration(_)
            | Self::Telemetry(_) => EXIT_USAGE,
            Self::Lifecycle(error) => lifecycle_exit_code(error),
        };
        ExitCode::from(code)
    }
}

const fn lifecycle_exit_code(error: &LifecycleError) -> u8 {
    match error {
        LifecycleError::AlreadyRunning { .. } => EXIT_ALREADY_RUNNING,
        LifecycleError::DetachedUnsupported
        | LifecycleError::Paths(_)
        | LifecycleError::HealthUrl { .. } => EXIT_USAGE,
        LifecycleError::Interrupted => EXIT_INTERRUPTED,
        LifecycleError::ResolveBinary { .. }
        | LifecycleError::SpawnFailed { .. }
        | LifecycleError::ServerExited { .. }
        | LifecycleError::MonitorChild { .. }
        | LifecycleError::SignalFailed { .. }
        | LifecycleError::SignalInstall { .. }
        | LifecycleError::HttpClient { .. }
        | LifecycleError::State(_)
        | LifecycleError::Io(_) => EXIT_START_FAILED,
    }
}

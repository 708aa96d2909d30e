//! Lifecycle command types and output abstractions.
//!
//! Defines the payloads and IO wrappers shared across lifecycle commands so the
//! controller can remain agnostic of concrete writers.

use std::fmt;
use std::io::Write;
use std::num::NonZeroU16;
use std::path::{Path, PathBuf};

use buckle_config::Config;

use super::LifecycleError;
use crate::cli::{CliCommand, UpArgs};

/// Supported lifecycle commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifecycleCommand {
    Up(UpRequest),
    Status,
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up(_) => formatter.write_str("up"),
            Self::Status => formatter.write_str("status"),
        }
    }
}

impl From<CliCommand> for LifecycleCommand {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Up(args) => Self::Up(args.into()),
            CliCommand::Status => Self::Status,
        }
    }
}

/// Options supplied to `buckle up`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpRequest {
    pub(crate) config_path: PathBuf,
    pub(crate) port: NonZeroU16,
    pub(crate) open: bool,
    pub(crate) detach: bool,
}

impl From<UpArgs> for UpRequest {
    fn from(args: UpArgs) -> Self {
        Self {
            config_path: args.config,
            port: args.port,
            open: args.open,
            detach: args.detach,
        }
    }
}

/// Shared configuration context available to lifecycle handlers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LifecycleContext<'a> {
    pub(crate) config: &'a Config,
    /// Server binary override injected by tests ahead of `Config::server_bin`.
    pub(crate) server_binary: Option<&'a Path>,
}

/// Immutable description of the server process to launch.
///
/// Built once by the CLI layer and only ever borrowed by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchConfig {
    pub(crate) binary_path: PathBuf,
    pub(crate) config_path: PathBuf,
    pub(crate) port: NonZeroU16,
    pub(crate) open_browser_on_ready: bool,
}

impl LaunchConfig {
    pub(crate) fn new(binary_path: PathBuf, request: &UpRequest) -> Self {
        Self {
            binary_path,
            config_path: request.config_path.clone(),
            port: request.port,
            open_browser_on_ready: request.open,
        }
    }
}

/// Output handle abstracting over stdout/stderr writers.
pub(crate) struct LifecycleOutput<W: Write, E: Write> {
    pub(crate) stdout: W,
    pub(crate) stderr: E,
}

impl<W: Write, E: Write> LifecycleOutput<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stdout.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stdout.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stdout.flush().map_err(LifecycleError::Io)
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stderr.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stderr.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stderr.flush().map_err(LifecycleError::Io)
    }
}

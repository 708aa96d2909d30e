//! Command-line interface runtime for the Buckle launcher.
//!
//! The module owns argument parsing, configuration bootstrapping, telemetry
//! set-up, and dispatch to the lifecycle commands. The interface is designed
//! to be exercised both from the binary entrypoint and from tests where
//! configuration loading, the server binary, and IO streams can be
//! substituted.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

mod cli;
mod config;
mod errors;
mod lifecycle;
mod telemetry;
#[cfg(test)]
mod tests;

use cli::Cli;
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use lifecycle::{
    LifecycleCommand, LifecycleContext, LifecycleError, LifecycleOutput, SystemLifecycle,
};

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: This list must be kept in sync with the fields of
/// `buckle_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--state-dir",
    "--server-bin",
    "--health-host",
    "--health-path",
    "--health-timeout-ms",
    "--health-request-timeout-ms",
    "--health-poll-interval-ms",
    "--log-filter",
    "--log-format",
];

/// Bundles the IO streams provided to the CLI runtime.
///
/// Lifecycle commands receive a short-lived [`LifecycleOutput`] wrapper that
/// borrows these streams.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    server_binary: Option<&'a Path>,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    const fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self {
            io,
            loader,
            server_binary: None,
        }
    }

    #[cfg(test)]
    fn with_server_binary(mut self, server_binary: Option<&'a Path>) -> Self {
        self.server_binary = server_binary;
        self
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut lifecycle = SystemLifecycle;
        self.run_with_handler(args, |command, context, output| {
            lifecycle.handle(command, context, output)
        })
    }

    fn run_with_handler<I, F>(&mut self, args: I, mut handler: F) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        F: FnMut(
            LifecycleCommand,
            LifecycleContext<'_>,
            &mut LifecycleOutput<&mut W, &mut E>,
        ) -> Result<ExitCode, LifecycleError>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let cli_arguments = prepare_cli_arguments(&args, &split);

        let cli = match Cli::try_parse_from(cli_arguments) {
            Ok(cli) => cli,
            Err(error) => return self.report_parse_error(error),
        };

        if cli.version {
            let _ = writeln!(self.io.stdout, "buckle {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }

        let result = self
            .loader
            .load(&split.config_arguments)
            .and_then(|config| {
                config.validate_health_timings()?;
                telemetry::initialise(&config)?;
                Ok(config)
            })
            .and_then(|config| {
                let Some(command) = cli.command else {
                    return Err(AppError::CliUsage(clap::Error::new(
                        ErrorKind::MissingSubcommand,
                    )));
                };
                let context = LifecycleContext {
                    config: &config,
                    server_binary: self.server_binary,
                };
                let mut output = LifecycleOutput::new(&mut *self.io.stdout, &mut *self.io.stderr);
                handler(command.into(), context, &mut output).map_err(AppError::from)
            });

        match result {
            Ok(exit_code) => exit_code,
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                error.exit_code()
            }
        }
    }

    /// Help and version requests succeed on stdout; every other parse
    /// failure is an incorrect invocation.
    fn report_parse_error(&mut self, error: clap::Error) -> ExitCode {
        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = write!(self.io.stdout, "{}", error.render());
                ExitCode::SUCCESS
            }
            _ => {
                let _ = write!(self.io.stderr, "{}", error.render());
                AppError::CliUsage(error).exit_code()
            }
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Returns the process exit code: `0` on success, `1` for incorrect
/// invocation or configuration, `2` when a server is already running, `3`
/// when the server fails to start or exits with failure, and `130` when
/// interrupted before the server becomes healthy.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let mut cli_arguments: Vec<OsString> = Vec::new();
    if let Some(first) = args.first() {
        cli_arguments.push(first.clone());
    }
    if split.command_start < args.len() {
        cli_arguments.extend(args[split.command_start..].iter().cloned());
    }
    cli_arguments
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}

#[cfg(test)]
pub(crate) fn run_with_server_binary<'a, I, W, E, L, F>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    server_binary: Option<&'a Path>,
    handler: F,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    F: FnMut(
        LifecycleCommand,
        LifecycleContext<'_>,
        &mut LifecycleOutput<&mut W, &mut E>,
    ) -> Result<ExitCode, LifecycleError>,
{
    CliRunner::new(io, loader)
        .with_server_binary(server_binary)
        .run_with_handler(args, handler)
}

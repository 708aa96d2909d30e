//! CLI argument definitions for the Buckle launcher.

use std::num::NonZeroU16;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Server configuration file passed to `buckle-server` by default.
pub(crate) const DEFAULT_SERVER_CONFIG: &str = "./buckle.yml";

/// Port the server listens on by default.
pub(crate) const DEFAULT_PORT: &str = "7260";

/// Command-line interface for the Buckle launcher.
#[derive(Parser, Debug)]
#[command(
    name = "buckle",
    about = "Start and supervise the Buckle server",
    disable_help_subcommand = true,
    disable_version_flag = true,
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Prints the launcher version and exits.
    #[arg(short = 'v', long = "version")]
    pub(crate) version: bool,
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

/// Structured subcommands for the Buckle CLI.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Starts the server and stays attached until it exits.
    Up(UpArgs),
    /// Reports whether a recorded server is running.
    Status,
}

/// Options for `buckle up`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpArgs {
    /// Server configuration file.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_SERVER_CONFIG)]
    pub(crate) config: PathBuf,
    /// Port the server listens on.
    #[arg(short, long, default_value = DEFAULT_PORT)]
    pub(crate) port: NonZeroU16,
    /// Opens the browser once the server is healthy.
    #[arg(short, long)]
    pub(crate) open: bool,
    /// Runs the server in the background (not supported).
    #[arg(short, long)]
    pub(crate) detach: bool,
}

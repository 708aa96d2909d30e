//! CLI entrypoint for the Buckle launcher.
//!
//! The binary delegates to [`buckle_cli::run`], which loads configuration,
//! processes command-line arguments, and supervises `buckle-server` for the
//! lifetime of the `up` command.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked: the tracing subscriber shares stderr while `up` stays attached.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    buckle_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

//! Crate-level tests for the CLI runner.

pub(crate) mod support;

use std::ffi::OsString;
use std::process::ExitCode;

use buckle_config::Config;
use rstest::rstest;

use super::*;
use support::{StaticConfigLoader, TestLifecycle};

struct Captured {
    exit: ExitCode,
    stdout: String,
    stderr: String,
    lifecycle: TestLifecycle,
}

fn run_stubbed(args: &[&str]) -> Captured {
    run_stubbed_with(Config::default(), args)
}

fn run_stubbed_with(config: Config, args: &[&str]) -> Captured {
    let lifecycle = TestLifecycle::default();
    let loader = StaticConfigLoader::new(config);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let arguments: Vec<OsString> = std::iter::once("buckle")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        run_with_server_binary(arguments, &mut io, &loader, None, |command, context, output| {
            lifecycle.handle(command, context, output)
        })
    };
    Captured {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
        lifecycle,
    }
}

#[rstest]
#[case("-v")]
#[case("--version")]
fn version_flag_prints_version_without_dispatch(#[case] flag: &str) {
    let captured = run_stubbed(&[flag]);

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    assert_eq!(
        captured.stdout,
        format!("buckle {}\n", env!("CARGO_PKG_VERSION"))
    );
    assert!(captured.lifecycle.calls().is_empty());
}

#[test]
fn help_flag_prints_usage_to_stdout() {
    let captured = run_stubbed(&["--help"]);

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    assert!(captured.stdout.contains("Usage:"));
    assert!(captured.stderr.is_empty());
}

#[test]
fn bare_invocation_is_incorrect_usage() {
    let captured = run_stubbed(&[]);

    assert_eq!(captured.exit, ExitCode::from(errors::EXIT_USAGE));
    assert!(captured.stderr.contains("Usage:"));
    assert!(captured.lifecycle.calls().is_empty());
}

#[test]
fn unknown_command_is_incorrect_usage() {
    let captured = run_stubbed(&["down"]);

    assert_eq!(captured.exit, ExitCode::from(errors::EXIT_USAGE));
    assert!(captured.stderr.contains("down"));
}

#[test]
fn launcher_flags_are_split_from_command_options() {
    let captured = run_stubbed(&["--state-dir", "/tmp/buckle-state", "up", "-p", "8080", "-o"]);

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    let calls = captured.lifecycle.calls();
    let [LifecycleCommand::Up(request)] = calls.as_slice() else {
        panic!("expected a single up command, got {calls:?}");
    };
    assert_eq!(request.port.get(), 8080);
    assert!(request.open);
    assert!(!request.detach);
}

#[rstest]
#[case(Config { health_request_timeout_ms: 0, ..Config::default() }, "health_request_timeout_ms")]
#[case(Config { health_poll_interval_ms: 0, ..Config::default() }, "health_poll_interval_ms")]
fn zero_health_timings_are_rejected_before_dispatch(
    #[case] config: Config,
    #[case] field: &str,
) {
    let captured = run_stubbed_with(config, &["up"]);

    assert_eq!(captured.exit, ExitCode::from(errors::EXIT_USAGE));
    assert!(captured.stderr.contains(field), "stderr: {}", captured.stderr);
    assert!(captured.lifecycle.calls().is_empty());
}

#[test]
fn lifecycle_errors_are_reported_with_their_exit_code() {
    let lifecycle = TestLifecycle::default();
    lifecycle.enqueue(Err(LifecycleError::AlreadyRunning { pid: 99 }));
    let loader = StaticConfigLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        run_with_server_binary(
            [OsString::from("buckle"), OsString::from("up")],
            &mut io,
            &loader,
            None,
            |command, context, output| lifecycle.handle(command, context, output),
        )
    };

    assert_eq!(exit, ExitCode::from(errors::EXIT_ALREADY_RUNNING));
    let stderr = String::from_utf8(stderr).expect("stderr utf8");
    assert!(stderr.contains("already running (process: 99)"));
}

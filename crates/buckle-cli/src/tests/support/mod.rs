//! Test support utilities for Buckle CLI behavioural coverage.
//!
//! Supplies fake servers, a stand-in health endpoint, and a world type that
//! drives the CLI runner with captured output so step definitions stay
//! focused on their assertions.

pub(crate) mod http;
mod lifecycle;
pub(crate) mod server;

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use buckle_config::{Config, StatePaths};
use rstest::fixture;
use tempfile::TempDir;

use crate::lifecycle::SystemLifecycle;
use crate::{AppError, ConfigLoader, IoStreams, run_with_server_binary};

pub(crate) use lifecycle::TestLifecycle;
use http::HealthServer;
use server::FakeServers;

/// A config loader that returns a fixed configuration for tests.
pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Test world holding the launcher configuration, fake collaborators, and
/// captured output.
pub(crate) struct TestWorld {
    pub config: Config,
    _state_dir: TempDir,
    pub servers: FakeServers,
    pub health: Option<HealthServer>,
    pub server_binary: Option<PathBuf>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    fn new() -> Result<Self> {
        let state_dir = TempDir::new().context("create state dir")?;
        let config = Config {
            state_dir: state_dir.path().join(".buckle"),
            health_host: String::from("127.0.0.1"),
            health_timeout_ms: 500,
            health_request_timeout_ms: 200,
            health_poll_interval_ms: 20,
            ..Config::default()
        };
        Ok(Self {
            config,
            _state_dir: state_dir,
            servers: FakeServers::new(),
            health: None,
            server_binary: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        })
    }

    pub fn paths(&self) -> StatePaths {
        StatePaths::new(self.config.state_dir.clone())
    }

    pub fn start_health_server(&mut self, status: u16) {
        self.health = Some(HealthServer::start(status));
    }

    /// Port of the running health responder.
    pub fn health_port(&self) -> Result<u16> {
        self.health
            .as_ref()
            .map(|server| server.port().get())
            .context("health responder not started")
    }

    /// Runs the CLI with the production lifecycle controller.
    pub fn run(&mut self, command: &str) -> Result<()> {
        self.stdout.clear();
        self.stderr.clear();
        let args = Self::build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let server_binary = self.server_binary.as_deref();
        let mut lifecycle = SystemLifecycle;
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let exit = run_with_server_binary(
            args,
            &mut io,
            &loader,
            server_binary,
            |command, context, output| lifecycle.handle(command, context, output),
        );
        self.exit_code = Some(exit);
        Ok(())
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("buckle")];
        args.extend(
            command
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .map(OsString::from),
        );
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout utf8")
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr utf8")
    }

    pub fn assert_exit_code(&self, expected: u8) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::from(expected),
            "expected exit code {expected}, got {exit:?}; stderr: {}",
            self.stderr_text()?
        );
        Ok(())
    }
}

#[fixture]
pub(crate) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new().expect("create test world"))
}

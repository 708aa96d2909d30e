//! High-level orchestration for lifecycle commands.
//!
//! Wires the supervisor to its production collaborators for `up` and answers
//! `status` from the PID record without modifying it.

use std::io::Write;
use std::process::ExitCode;
use std::time::SystemTime;

use buckle_config::StatePaths;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::browser::SystemBrowser;
use super::error::{LifecycleError, StateError};
use super::health::{HealthEndpoint, HealthPolicy, HealthWaiter, HttpHealthProbe};
use super::liveness::{LivenessProbe, SystemLivenessProbe};
use super::shutdown::CancellationToken;
use super::spawning::resolve_server_binary;
use super::state::StateStore;
use super::supervisor::{Readiness, RunOutcome, Supervisor, SupervisorParts};
use super::types::{LaunchConfig, LifecycleCommand, LifecycleContext, LifecycleOutput, UpRequest};

/// Production lifecycle controller.
#[derive(Debug, Default)]
pub(crate) struct SystemLifecycle;

impl SystemLifecycle {
    pub(crate) fn handle<W: Write, E: Write>(
        &mut self,
        command: LifecycleCommand,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        match command {
            LifecycleCommand::Up(request) => self.up(&request, context, output),
            LifecycleCommand::Status => self.status(context, output),
        }
    }

    fn up<W: Write, E: Write>(
        &mut self,
        request: &UpRequest,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        if request.detach {
            return Err(LifecycleError::DetachedUnsupported);
        }
        let config = context.config;
        let paths = StatePaths::from_config(config)?;
        let binary = resolve_server_binary(context.server_binary.or_else(|| config.server_bin()))?;
        let launch = LaunchConfig::new(binary, request);
        let cancel = CancellationToken::install()?;
        let policy = HealthPolicy::from_config(config);

        let mut supervisor = Supervisor::new(SupervisorParts {
            store: StateStore::new(paths),
            liveness: SystemLivenessProbe,
            waiter: HealthWaiter::new(HttpHealthProbe::new()?, policy),
            browser: SystemBrowser,
            endpoint: HealthEndpoint::from_config(config),
            cancel: cancel.clone(),
        });
        let mut running = supervisor.start(&launch)?;
        match running.readiness() {
            Readiness::Healthy => output.stdout_line(format_args!(
                "Buckle is running at {} (process: {}); press Ctrl-C to stop",
                running.address(),
                running.pid()
            ))?,
            Readiness::Unconfirmed => output.stderr_line(format_args!(
                "warning: server (process: {}) did not report healthy at {} within {} ms; leaving it running",
                running.pid(),
                running.address(),
                policy.overall_timeout.as_millis()
            ))?,
        }

        let outcome = running.wait(&cancel, policy.poll_interval)?;
        drop(running);
        match outcome {
            RunOutcome::Exited => output.stdout_line(format_args!("Buckle server exited"))?,
            RunOutcome::Stopped => output.stdout_line(format_args!("Buckle server stopped"))?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn status<W: Write, E: Write>(
        &mut self,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let store = StateStore::new(StatePaths::from_config(context.config)?);
        report_status(&store, &SystemLivenessProbe, output)?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Describes the recorded server without purging stale or corrupt records.
pub(super) fn report_status<L, W, E>(
    store: &StateStore,
    liveness: &L,
    output: &mut LifecycleOutput<W, E>,
) -> Result<(), LifecycleError>
where
    L: LivenessProbe,
    W: Write,
    E: Write,
{
    let paths = store.paths();
    match store.read_record() {
        Ok(None) => {
            output.stdout_line(format_args!(
                "buckle is not running (no pid file at {})",
                paths.pid_path().display()
            ))?;
        }
        Ok(Some(record)) if liveness.is_alive(record.pid) => {
            output.stdout_line(format_args!(
                "buckle is running (process: {}, started: {})",
                record.pid,
                format_started_at(record.started_at)
            ))?;
        }
        Ok(Some(record)) => {
            output.stdout_line(format_args!(
                "buckle is not running; pid file {} names exited process {}",
                paths.pid_path().display(),
                record.pid
            ))?;
        }
        Err(StateError::CorruptRecord { path, .. }) => {
            output.stdout_line(format_args!(
                "buckle is not running; pid file {} is corrupt",
                path.display()
            ))?;
        }
        Err(error) => return Err(error.into()),
    }
    output.stdout_line(format_args!(
        "state directory: {}",
        paths.state_dir().display()
    ))?;
    output.stdout_line(format_args!("log file: {}", paths.log_path().display()))
}

fn format_started_at(started_at: Option<SystemTime>) -> String {
    started_at
        .and_then(|time| OffsetDateTime::from(time).format(&Rfc3339).ok())
        .unwrap_or_else(|| String::from("unknown"))
}

//! Start-up state machine for the supervised server.
//!
//! [`Supervisor::start`] walks `Idle → CheckingExisting → Spawning →
//! AwaitingHealth → Ready`, falling into `Failed` on any error. The returned
//! [`RunningServer`] owns the child process and the [`RecordGuard`], so the PID
//! record disappears with it regardless of how the attached run ends.

use std::fmt;
use std::io;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::LIFECYCLE_TARGET;
use super::browser::BrowserOpener;
use super::error::{ExitStage, LifecycleError, StateError};
use super::health::{HealthEndpoint, HealthProbe, HealthWaiter, WaitOutcome};
use super::liveness::LivenessProbe;
use super::shutdown::{CancellationToken, SHUTDOWN_GRACE, terminate_child};
use super::spawning::spawn_server;
use super::state::{RecordGuard, StateStore};
use super::types::LaunchConfig;

/// Supervisor progress through start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SupervisorState {
    Idle,
    CheckingExisting,
    Spawning,
    AwaitingHealth,
    Ready,
    Failed,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::CheckingExisting => "checking-existing",
            Self::Spawning => "spawning",
            Self::AwaitingHealth => "awaiting-health",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        formatter.write_str(label)
    }
}

/// Whether the health endpoint confirmed readiness before the budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Healthy,
    /// The wait timed out; the server keeps running regardless.
    Unconfirmed,
}

/// How the attached run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// The server exited successfully on its own.
    Exited,
    /// An interrupt stopped the server.
    Stopped,
}

/// Collaborators consumed by [`Supervisor`].
pub(crate) struct SupervisorParts<L, P, B> {
    pub(crate) store: StateStore,
    pub(crate) liveness: L,
    pub(crate) waiter: HealthWaiter<P>,
    pub(crate) browser: B,
    pub(crate) endpoint: HealthEndpoint,
    pub(crate) cancel: CancellationToken,
}

/// Starts a single server per state directory and confirms its health.
pub(crate) struct Supervisor<L, P, B> {
    store: StateStore,
    liveness: L,
    waiter: HealthWaiter<P>,
    browser: B,
    endpoint: HealthEndpoint,
    cancel: CancellationToken,
    state: SupervisorState,
}

impl<L, P, B> Supervisor<L, P, B>
where
    L: LivenessProbe,
    P: HealthProbe,
    B: BrowserOpener,
{
    pub(crate) fn new(parts: SupervisorParts<L, P, B>) -> Self {
        Self {
            store: parts.store,
            liveness: parts.liveness,
            waiter: parts.waiter,
            browser: parts.browser,
            endpoint: parts.endpoint,
            cancel: parts.cancel,
            state: SupervisorState::Idle,
        }
    }

    pub(crate) const fn state(&self) -> SupervisorState {
        self.state
    }

    /// Launches the server unless a live one is already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] without touching the state
    /// directory when the recorded process is alive. Spawn failures leave no
    /// record behind. An interrupt or an early exit while waiting for health
    /// terminates the child and clears the record.
    pub(crate) fn start(&mut self, launch: &LaunchConfig) -> Result<RunningServer, LifecycleError> {
        let result = self.try_start(launch);
        if result.is_err() {
            self.transition(SupervisorState::Failed);
        }
        result
    }

    fn try_start(&mut self, launch: &LaunchConfig) -> Result<RunningServer, LifecycleError> {
        self.transition(SupervisorState::CheckingExisting);
        self.purge_stale_record()?;
        let address = self.endpoint.base_url(launch.port)?;
        let health_url = self.endpoint.health_url(launch.port)?;
        if self.cancel.is_cancelled() {
            return Err(LifecycleError::Interrupted);
        }

        self.transition(SupervisorState::Spawning);
        let mut child = spawn_server(launch)?;
        let pid = child.id();
        if let Err(error) = self.store.write_record(pid) {
            stop_child(&mut child);
            return Err(error.into());
        }
        let guard = RecordGuard::new(self.store.clone(), pid);
        info!(
            target: LIFECYCLE_TARGET,
            pid,
            binary = %launch.binary_path.display(),
            port = launch.port.get(),
            "server process started"
        );

        self.transition(SupervisorState::AwaitingHealth);
        let outcome = self
            .waiter
            .wait_until_ready(&health_url, &self.cancel, || {
                matches!(child.try_wait(), Ok(None))
            });
        let readiness = match outcome {
            WaitOutcome::Ready(report) => {
                info!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    attempts = report.attempts,
                    elapsed_ms = report.elapsed.as_millis(),
                    "server reported healthy"
                );
                Readiness::Healthy
            }
            WaitOutcome::TimedOut(report) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    url = %health_url,
                    attempts = report.attempts,
                    elapsed_ms = report.elapsed.as_millis(),
                    last_failure = report.last_failure.as_ref().map(ToString::to_string),
                    "server did not report healthy in time; leaving it running"
                );
                Readiness::Unconfirmed
            }
            WaitOutcome::Cancelled => {
                info!(target: LIFECYCLE_TARGET, pid, "interrupted while awaiting health");
                stop_child(&mut child);
                drop(guard);
                return Err(LifecycleError::Interrupted);
            }
            WaitOutcome::Abandoned => {
                let observed = child.try_wait();
                let error = early_exit_error(&mut child, observed);
                drop(guard);
                return Err(error);
            }
        };

        self.transition(SupervisorState::Ready);
        if readiness == Readiness::Healthy && launch.open_browser_on_ready {
            self.open_browser(&address);
        }
        Ok(RunningServer {
            child,
            guard,
            readiness,
            address,
        })
    }

    fn purge_stale_record(&self) -> Result<(), LifecycleError> {
        match self.store.read_record() {
            Ok(None) => Ok(()),
            Ok(Some(record)) if self.liveness.is_alive(record.pid) => {
                Err(LifecycleError::AlreadyRunning { pid: record.pid })
            }
            Ok(Some(record)) => {
                info!(
                    target: LIFECYCLE_TARGET,
                    pid = record.pid,
                    "removing stale pid file"
                );
                self.store.clear_record()?;
                Ok(())
            }
            Err(StateError::CorruptRecord { path, content }) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    file = %path.display(),
                    content = %content,
                    "pid file is corrupt; treating it as stale"
                );
                self.store.clear_record()?;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    fn open_browser(&self, address: &Url) {
        if let Err(error) = self.browser.open(address) {
            warn!(
                target: LIFECYCLE_TARGET,
                url = %address,
                error = %error,
                "failed to open browser"
            );
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(
            target: LIFECYCLE_TARGET,
            from = %self.state,
            to = %next,
            "supervisor state changed"
        );
        self.state = next;
    }
}

fn stop_child(child: &mut Child) {
    if let Err(error) = terminate_child(child, SHUTDOWN_GRACE) {
        warn!(
            target: LIFECYCLE_TARGET,
            pid = child.id(),
            error = %error,
            "failed to stop server process"
        );
    }
}

/// Builds the start-up failure once the health wait was abandoned.
///
/// The child normally has exited already. When its status cannot be read it
/// is stopped anyway, so clearing the record never orphans a live server.
pub(super) fn early_exit_error(
    child: &mut Child,
    observed: io::Result<Option<ExitStatus>>,
) -> LifecycleError {
    match observed {
        Ok(status) => LifecycleError::ServerExited {
            stage: ExitStage::Startup,
            status: status.and_then(|exit| exit.code()),
        },
        Err(source) => {
            stop_child(child);
            LifecycleError::MonitorChild { source }
        }
    }
}

/// A started server together with the guard that owns its PID record.
#[derive(Debug)]
pub(crate) struct RunningServer {
    child: Child,
    guard: RecordGuard,
    readiness: Readiness,
    address: Url,
}

impl RunningServer {
    pub(crate) const fn pid(&self) -> u32 {
        self.guard.pid()
    }

    pub(crate) const fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub(crate) const fn address(&self) -> &Url {
        &self.address
    }

    /// Stays attached until the server exits or `cancel` fires.
    ///
    /// An interrupt stops the server with `SIGTERM`, escalating to `SIGKILL`
    /// after the grace period.
    pub(crate) fn wait(
        &mut self,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> Result<RunOutcome, LifecycleError> {
        loop {
            if let Some(status) = self
                .child
                .try_wait()
                .map_err(|source| LifecycleError::MonitorChild { source })?
            {
                debug!(target: LIFECYCLE_TARGET, pid = self.pid(), %status, "server exited");
                if status.success() {
                    return Ok(RunOutcome::Exited);
                }
                return Err(LifecycleError::ServerExited {
                    stage: ExitStage::Running,
                    status: status.code(),
                });
            }
            if !cancel.sleep(poll_interval) {
                info!(
                    target: LIFECYCLE_TARGET,
                    pid = self.pid(),
                    "interrupt received; stopping server"
                );
                let status = terminate_child(&mut self.child, SHUTDOWN_GRACE)?;
                debug!(target: LIFECYCLE_TARGET, pid = self.pid(), %status, "server stopped");
                return Ok(RunOutcome::Stopped);
            }
        }
    }
}

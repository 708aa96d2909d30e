//! Interrupt handling and server termination.
//!
//! [`CancellationToken`] is the single cancellation source shared by the
//! health wait and the attached run. Termination of the child follows the
//! usual escalation: `SIGTERM`, a bounded grace period, then `SIGKILL`.

use std::process::{Child, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use tracing::{debug, warn};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;

const SLEEP_SLICE: Duration = Duration::from_millis(25);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Grace period between `SIGTERM` and `SIGKILL`.
pub(crate) const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const INTERRUPT_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// Shared flag flipped by interrupt signals or by an explicit cancel.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled when the launcher receives
    /// `SIGINT`, `SIGTERM`, `SIGHUP`, or `SIGQUIT`.
    pub(crate) fn install() -> Result<Self, LifecycleError> {
        let token = Self::new();
        for signal in INTERRUPT_SIGNALS {
            signal_hook::flag::register(signal, Arc::clone(&token.flag))
                .map_err(|source| LifecycleError::SignalInstall { source })?;
        }
        Ok(token)
    }

    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` in short slices.
    ///
    /// Returns `false` as soon as the token is cancelled and `true` once the
    /// full duration has elapsed.
    pub(crate) fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Stops `child`, escalating to `SIGKILL` once `grace` expires.
///
/// Returns the exit status of the reaped child.
pub(crate) fn terminate_child(
    child: &mut Child,
    grace: Duration,
) -> Result<ExitStatus, LifecycleError> {
    if let Some(status) = child
        .try_wait()
        .map_err(|source| LifecycleError::MonitorChild { source })?
    {
        return Ok(status);
    }

    let pid = child.id();
    if let Ok(raw) = i32::try_from(pid) {
        match kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(source) => return Err(LifecycleError::SignalFailed { pid, source }),
        }
    }
    debug!(target: LIFECYCLE_TARGET, pid, "sent SIGTERM to server");

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if let Some(status) = child
            .try_wait()
            .map_err(|source| LifecycleError::MonitorChild { source })?
        {
            return Ok(status);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }

    warn!(
        target: LIFECYCLE_TARGET,
        pid,
        grace_ms = grace.as_millis(),
        "server ignored SIGTERM; sending SIGKILL"
    );
    if let Err(source) = child.kill() {
        debug!(target: LIFECYCLE_TARGET, pid, error = %source, "SIGKILL failed");
    }
    child
        .wait()
        .map_err(|source| LifecycleError::MonitorChild { source })
}

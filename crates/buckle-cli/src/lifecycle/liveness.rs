//! Process liveness probing.

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::debug;

use super::LIFECYCLE_TARGET;

/// Answers whether a process id refers to a live process.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait LivenessProbe {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probes liveness with signal 0, which checks existence without delivering
/// anything to the target.
///
/// A process owned by another user reports `EPERM`; it is treated as not alive
/// because this launcher could never have started it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemLivenessProbe;

impl LivenessProbe for SystemLivenessProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }
        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::ESRCH | Errno::EPERM) => false,
            Err(errno) => {
                debug!(
                    target: LIFECYCLE_TARGET,
                    pid,
                    error = %errno,
                    "liveness probe failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use rstest::rstest;

    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(SystemLivenessProbe.is_alive(std::process::id()));
    }

    #[test]
    fn reaped_child_is_not_alive() {
        let mut child = Command::new("true").spawn().expect("spawn child");
        let pid = child.id();
        child.wait().expect("reap child");

        assert!(!SystemLivenessProbe.is_alive(pid));
    }

    #[rstest]
    #[case(0)]
    #[case(u32::MAX)]
    #[case(1 << 31)]
    fn out_of_range_pids_are_not_alive(#[case] pid: u32) {
        assert!(!SystemLivenessProbe.is_alive(pid));
    }
}

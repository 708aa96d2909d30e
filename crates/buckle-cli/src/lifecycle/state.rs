//! PID record persistence inside the state directory.
//!
//! The record is a single decimal process id. Writes go through a temporary
//! file that is fsync'd and renamed into place, so a concurrent reader sees
//! either the previous record or the complete new one.

use std::fs::{self, DirBuilder};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use buckle_config::StatePaths;
use tempfile::Builder;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

use super::LIFECYCLE_TARGET;
use super::error::StateError;

/// Persisted identity of the supervised server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) pid: u32,
    /// Modification time of the PID file, when the filesystem reports one.
    pub(crate) started_at: Option<SystemTime>,
}

/// Reads, writes, and clears the PID record.
#[derive(Debug, Clone)]
pub(crate) struct StateStore {
    paths: StatePaths,
}

impl StateStore {
    pub(crate) const fn new(paths: StatePaths) -> Self {
        Self { paths }
    }

    pub(crate) const fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Returns the current record, or `None` when no PID file exists.
    ///
    /// Content that is not a positive decimal process id is reported as
    /// [`StateError::CorruptRecord`] so callers can decide whether to discard
    /// it.
    pub(crate) fn read_record(&self) -> Result<Option<Record>, StateError> {
        let path = self.paths.pid_path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::ReadRecord {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let pid = parse_pid(&content).ok_or_else(|| StateError::CorruptRecord {
            path: path.to_path_buf(),
            content: content.clone(),
        })?;
        let started_at = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok();
        Ok(Some(Record { pid, started_at }))
    }

    /// Atomically replaces the record with `pid`, creating the state
    /// directory when it is missing.
    pub(crate) fn write_record(&self, pid: u32) -> Result<Record, StateError> {
        self.ensure_state_dir()?;
        let path = self.paths.pid_path();
        atomic_write(path, format!("{pid}\n").as_bytes()).map_err(|source| {
            StateError::WriteRecord {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(
            target: LIFECYCLE_TARGET,
            pid,
            file = %path.display(),
            "pid file written"
        );
        Ok(Record {
            pid,
            started_at: Some(SystemTime::now()),
        })
    }

    /// Removes the record. A missing file is not an error.
    pub(crate) fn clear_record(&self) -> Result<(), StateError> {
        let path = self.paths.pid_path();
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(
                    target: LIFECYCLE_TARGET,
                    file = %path.display(),
                    "pid file removed"
                );
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::RemoveRecord {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn ensure_state_dir(&self) -> Result<(), StateError> {
        let directory = self.paths.state_dir();
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        match builder.create(directory) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(StateError::CreateDirectory {
                path: directory.to_path_buf(),
                source,
            }),
        }
    }
}

fn parse_pid(content: &str) -> Option<u32> {
    content
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid != 0)
}

fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "pid file path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(".buckle.pid");
    #[cfg(unix)]
    builder.permissions(fs::Permissions::from_mode(0o644));

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Clears the PID record when dropped.
///
/// The record is only removed while it still names the process this guard was
/// created for, so a record written by a later launcher is left in place.
#[derive(Debug)]
pub(crate) struct RecordGuard {
    store: StateStore,
    pid: u32,
}

impl RecordGuard {
    pub(crate) const fn new(store: StateStore, pid: u32) -> Self {
        Self { store, pid }
    }

    pub(crate) const fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        match self.store.read_record() {
            Ok(Some(record)) if record.pid == self.pid => {}
            Ok(Some(record)) => {
                debug!(
                    target: LIFECYCLE_TARGET,
                    ours = self.pid,
                    recorded = record.pid,
                    "pid file names another process; leaving it in place"
                );
                return;
            }
            Ok(None) => return,
            Err(error) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    error = %error,
                    "failed to inspect pid file during cleanup"
                );
                return;
            }
        }
        if let Err(error) = self.store.clear_record() {
            warn!(
                target: LIFECYCLE_TARGET,
                error = %error,
                "failed to remove pid file"
            );
        }
    }
}

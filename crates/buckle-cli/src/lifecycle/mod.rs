//! Lifecycle management for `buckle-server`.
//!
//! This module is split into focused submodules so each concern remains small and
//! testable:
//! - [`types`] defines the user-facing command models and IO helpers.
//! - [`error`] captures the error surface exposed to the CLI.
//! - [`state`] persists the PID record inside the state directory.
//! - [`liveness`] answers whether a recorded process is still alive.
//! - [`health`] polls the server's HTTP health endpoint.
//! - [`shutdown`] handles interrupts and child termination.
//! - [`spawning`] resolves and launches the server binary.
//! - [`browser`] opens the server address once it is healthy.
//! - [`supervisor`] implements the start-up state machine.
//! - [`controller`] implements the high-level `up` and `status` flows.

mod browser;
mod controller;
mod error;
mod health;
mod liveness;
mod shutdown;
mod spawning;
mod state;
mod supervisor;
mod types;

/// Tracing target for lifecycle events.
pub(crate) const LIFECYCLE_TARGET: &str = "buckle_cli::lifecycle";

pub(crate) use controller::SystemLifecycle;
pub(crate) use error::LifecycleError;
#[cfg(test)]
pub(crate) use error::ExitStage;
pub(crate) use types::{LifecycleCommand, LifecycleContext, LifecycleOutput};

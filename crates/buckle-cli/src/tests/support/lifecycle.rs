//! Lifecycle double that records commands and replays queued results.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::process::ExitCode;

use crate::lifecycle::{LifecycleCommand, LifecycleContext, LifecycleError, LifecycleOutput};

#[derive(Default)]
pub(crate) struct TestLifecycle {
    calls: RefCell<Vec<LifecycleCommand>>,
    responses: RefCell<VecDeque<Result<ExitCode, LifecycleError>>>,
}

impl TestLifecycle {
    /// Returns every command handled so far.
    pub fn calls(&self) -> Vec<LifecycleCommand> {
        self.calls.borrow().clone()
    }

    /// Enqueues a result to be returned by the next `handle` call.
    pub fn enqueue(&self, result: Result<ExitCode, LifecycleError>) {
        self.responses.borrow_mut().push_back(result);
    }

    pub fn handle<W: Write, E: Write>(
        &self,
        command: LifecycleCommand,
        _context: LifecycleContext<'_>,
        _output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        self.calls.borrow_mut().push(command);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(ExitCode::SUCCESS))
    }
}

// src/exec/backend.rs

//! Pluggable task executor abstraction.
//!
//! Dispatch talks to a `TaskExecutor` instead of a concrete runner. This
//! makes it easy to swap in a fake executor in tests while keeping the
//! production process runner in [`super::runner`].
//!
//! - `ProcessRunner` is the implementation used by `poolrun`: it spawns a
//!   real OS process per task.
//! - Tests can provide their own `TaskExecutor` that, for example, records
//!   which tasks were executed and returns scripted outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::dag::Task;
use crate::errors::Result;

use super::log::RunLog;
use super::runner::{Outcome, ProcessRunner};

/// Trait abstracting how a single resolved task is executed.
///
/// Implementations return a normal [`Outcome`] for nonzero exits and launch
/// failures; `Err` is reserved for infrastructure problems such as a log file
/// that cannot be written.
pub trait TaskExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        log: &'a RunLog,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>>;
}

impl TaskExecutor for ProcessRunner {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        log: &'a RunLog,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        Box::pin(async move { Ok(ProcessRunner::execute(self, task, log).await?) })
    }
}

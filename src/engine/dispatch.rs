// src/engine/dispatch.rs

//! Per-task policy: skip, run, mark, tolerate or fail.

use std::sync::Arc;

use tracing::{info, warn};

use crate::checkpoint::CompletionMarkers;
use crate::dag::Task;
use crate::errors::{PipelineError, Result};
use crate::exec::{Outcome, RunLogs, TaskExecutor};

/// What dispatching a task amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A completion marker already existed; the executor was not called.
    AlreadyDone,
    /// The task ran and exited 0.
    Succeeded(Outcome),
    /// A non-critical task failed; it was marked complete anyway.
    Tolerated(Outcome),
}

/// Shared services every dispatch needs.
pub struct DispatchContext<E: ?Sized> {
    pub executor: Arc<E>,
    pub markers: CompletionMarkers,
    pub logs: Arc<RunLogs>,
}

impl<E: ?Sized> Clone for DispatchContext<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            markers: self.markers.clone(),
            logs: Arc::clone(&self.logs),
        }
    }
}

impl<E: TaskExecutor + ?Sized> DispatchContext<E> {
    pub fn new(executor: Arc<E>, markers: CompletionMarkers, logs: Arc<RunLogs>) -> Self {
        Self {
            executor,
            markers,
            logs,
        }
    }

    /// Dispatch one resolved task belonging to `pool`.
    ///
    /// 1. Already completed: note the skip in the log, succeed.
    /// 2. Otherwise execute.
    /// 3. Success: write the marker, succeed.
    /// 4. Failure or launch failure: non-critical tasks are marked and
    ///    tolerated; critical ones return a [`PipelineError`] and leave no
    ///    marker.
    pub async fn dispatch(&self, pool: &str, task: &Task) -> Result<Dispatched> {
        let log = self.logs.for_folder(&task.output_folder);

        if self.markers.has_completed(task) {
            info!(pool = %pool, task = %task.name, "already completed; skipping");
            log.begin_entry(&format!(
                "The task {} has already been run! (i.e. the command {} was NOT executed)",
                task.name,
                task.display_command()
            ))
            .await?;
            return Ok(Dispatched::AlreadyDone);
        }

        let outcome = self.executor.execute(task, &log).await?;

        let message = match &outcome {
            Outcome::Success { .. } => {
                self.markers.mark_completed(task)?;
                return Ok(Dispatched::Succeeded(outcome.clone()));
            }
            Outcome::Failure {
                exit_code: Some(code),
                ..
            } => format!("exit code {code}"),
            Outcome::Failure {
                exit_code: None, ..
            } => "terminated by signal".to_string(),
            Outcome::LaunchFailure { reason } => format!("could not be launched: {reason}"),
        };

        if !task.critical {
            warn!(
                pool = %pool,
                task = %task.name,
                reason = %message,
                "non-critical task failed; tolerating"
            );
            self.markers.mark_completed(task)?;
            return Ok(Dispatched::Tolerated(outcome));
        }

        Err(PipelineError::task_failed(pool, &task.name, message).into())
    }
}

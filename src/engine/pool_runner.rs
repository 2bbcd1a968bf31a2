// src/engine/pool_runner.rs

//! Runs one pool's tasks in declared order.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dag::Pool;
use crate::engine::dispatch::{DispatchContext, Dispatched};
use crate::errors::Result;
use crate::exec::TaskExecutor;
use crate::types::TaskName;

/// What a successful pool run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    /// Location successors inherit.
    pub location: PathBuf,
    /// Per-task result in execution order. Empty for a pass-through pool.
    pub tasks: Vec<(TaskName, Dispatched)>,
}

impl PoolReport {
    pub fn tolerated(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, d)| matches!(d, Dispatched::Tolerated(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, d)| matches!(d, Dispatched::AlreadyDone))
            .count()
    }
}

/// Run `pool` starting from `inherited`.
///
/// Each task is resolved against the current location just before it is
/// dispatched; a task that declares an output moves the current location for
/// the tasks after it. The first critical failure stops the pool and is
/// returned as-is.
pub async fn run_pool<E>(pool: &Pool, inherited: &Path, ctx: &DispatchContext<E>) -> Result<PoolReport>
where
    E: TaskExecutor + ?Sized,
{
    if pool.is_empty() {
        debug!(pool = %pool.name, "pool has no tasks; passing location through");
        return Ok(PoolReport {
            location: inherited.to_path_buf(),
            tasks: Vec::new(),
        });
    }

    info!(
        pool = %pool.name,
        tasks = pool.tasks.len(),
        location = %inherited.display(),
        "starting pool"
    );

    let mut current = inherited.to_path_buf();
    let mut tasks = Vec::with_capacity(pool.tasks.len());

    for template in &pool.tasks {
        let task = template.resolve(&current);
        let dispatched = ctx.dispatch(&pool.name, &task).await?;

        if let Some(out) = task.output {
            current = out;
        }
        tasks.push((task.name, dispatched));
    }

    let report = PoolReport {
        location: current,
        tasks,
    };
    info!(
        pool = %pool.name,
        location = %report.location.display(),
        skipped = report.skipped(),
        tolerated = report.tolerated(),
        "pool finished"
    );
    Ok(report)
}

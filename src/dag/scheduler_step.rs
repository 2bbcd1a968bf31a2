// src/dag/scheduler_step.rs

//! Step-by-step result types for the scheduler.

use std::path::PathBuf;

use crate::types::PoolName;

/// A pool the scheduler wants started now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPool {
    pub name: PoolName,
    /// Position in the declared pipeline order.
    pub index: usize,
    /// Location the pool starts from.
    pub inherited_location: PathBuf,
}

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Pools that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledPool>,
    /// Pools that will never run because a predecessor failed.
    pub newly_blocked: Vec<PoolName>,
    /// Pools that will never run because the run was aborted.
    pub newly_not_started: Vec<PoolName>,
    /// Whether every pool is now in a terminal state.
    pub run_just_finished: bool,
}

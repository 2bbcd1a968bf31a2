// src/engine/mod.rs

//! Orchestration engine for poolrun.
//!
//! This module ties together:
//! - per-task dispatch policy ([`dispatch`])
//! - sequential execution of one pool's tasks ([`pool_runner`])
//! - the pool scheduler driven by pool completions
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! spawns pools is implemented in [`runtime`]. [`orchestrator`] is the
//! entry point that wires them up.

use std::path::{Path, PathBuf};

use crate::dag::PoolRunState;
use crate::errors::Result;
use crate::types::PoolName;

pub mod core;
pub mod dispatch;
pub mod orchestrator;
pub mod pool_runner;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use dispatch::{DispatchContext, Dispatched};
pub use orchestrator::Orchestrator;
pub use pool_runner::{PoolReport, run_pool};
pub use runtime::Runtime;

/// Events flowing into the core from running pools.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// A pool stopped dispatching, successfully or not.
    PoolFinished {
        pool: PoolName,
        result: Result<PoolReport>,
    },
}

/// Options for a whole pipeline run.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Names the run; each location's log is `<run_name>.log`.
    pub run_name: String,
    /// Allow pools without a predecessor relation to run concurrently.
    pub parallel_pools: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            run_name: "pipeline".to_string(),
            parallel_pools: true,
        }
    }
}

/// Final state of one pool.
#[derive(Debug, Clone)]
pub struct PoolSummary {
    pub name: PoolName,
    pub state: PoolRunState,
    /// Location handed to successors; `None` if the pool did not succeed.
    pub location: Option<PathBuf>,
    pub report: Option<PoolReport>,
}

/// Outcome of a pipeline run that reached the end without a critical failure.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// In declared order.
    pub pools: Vec<PoolSummary>,
}

impl RunSummary {
    pub fn pool(&self, name: &str) -> Option<&PoolSummary> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn location_of(&self, name: &str) -> Option<&Path> {
        self.pool(name).and_then(|p| p.location.as_deref())
    }

    pub fn count(&self, state: PoolRunState) -> usize {
        self.pools.iter().filter(|p| p.state == state).count()
    }

    /// Pools that succeeded without running any task.
    pub fn passed_through(&self) -> usize {
        self.pools
            .iter()
            .filter(|p| p.report.as_ref().is_some_and(|r| r.tasks.is_empty()))
            .count()
    }
}

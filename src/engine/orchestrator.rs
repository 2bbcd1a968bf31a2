// src/engine/orchestrator.rs

//! Entry point for running a whole pipeline of pools.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::checkpoint::CompletionMarkers;
use crate::dag::{Pool, PoolGraph, Scheduler};
use crate::errors::Result;
use crate::exec::{ProcessRunner, RunLogs, TaskExecutor};

use super::core::CoreRuntime;
use super::dispatch::DispatchContext;
use super::runtime::Runtime;
use super::{OrchestratorOptions, RunSummary};

/// Owns the declared pools and the services needed to run them.
///
/// Pools may be declared in any order; the predecessor relation alone
/// decides when each one starts.
pub struct Orchestrator<E: TaskExecutor + ?Sized = ProcessRunner> {
    pools: Vec<Pool>,
    options: OrchestratorOptions,
    executor: Arc<E>,
    markers: CompletionMarkers,
}

impl Orchestrator<ProcessRunner> {
    /// Orchestrator that launches real OS processes.
    pub fn new(pools: Vec<Pool>, options: OrchestratorOptions) -> Self {
        Self::with_executor(pools, options, Arc::new(ProcessRunner::new()))
    }
}

impl<E: TaskExecutor + ?Sized + 'static> Orchestrator<E> {
    pub fn with_executor(pools: Vec<Pool>, options: OrchestratorOptions, executor: Arc<E>) -> Self {
        Self {
            pools,
            options,
            executor,
            markers: CompletionMarkers::on_disk(),
        }
    }

    /// Use a different marker store (for example one backed by a mock
    /// filesystem).
    pub fn with_markers(mut self, markers: CompletionMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Run every pool, starting from `input`.
    ///
    /// Validates the predecessor relation first; a cycle or a dangling
    /// predecessor fails before any task runs. On a critical failure the
    /// first error is returned unchanged once in-flight pools have drained.
    pub async fn run(self, input: impl Into<PathBuf>) -> Result<RunSummary> {
        let input = input.into();
        let graph = PoolGraph::new(&self.pools)?;

        let max_in_flight = if self.options.parallel_pools {
            None
        } else {
            Some(1)
        };
        info!(
            run = %self.options.run_name,
            pools = graph.len(),
            input = %input.display(),
            parallel = self.options.parallel_pools,
            "starting pipeline"
        );

        let scheduler = Scheduler::new(graph, input, max_in_flight);
        let core = CoreRuntime::new(scheduler);
        let ctx = DispatchContext::new(
            self.executor,
            self.markers,
            Arc::new(RunLogs::new(&self.options.run_name)),
        );

        Runtime::new(core, self.pools, ctx).run().await
    }
}

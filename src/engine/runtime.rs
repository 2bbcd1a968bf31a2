// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::dag::{Pool, ScheduledPool};
use crate::errors::{PoolrunError, Result};
use crate::exec::TaskExecutor;
use crate::types::PoolName;

use super::core::CoreRuntime;
use super::dispatch::DispatchContext;
use super::pool_runner::run_pool;
use super::{CoreCommand, RunSummary, RuntimeEvent};

/// Drives the pool scheduler in response to pool completions and runs each
/// released pool on its own Tokio task.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// scheduling semantics. This struct handles the async side: spawning pools
/// and collecting their results as they finish.
pub struct Runtime<E: TaskExecutor + ?Sized + 'static> {
    core: CoreRuntime,
    pools: HashMap<PoolName, Arc<Pool>>,
    ctx: DispatchContext<E>,
    in_flight: JoinSet<RuntimeEvent>,
}

impl<E: TaskExecutor + ?Sized + 'static> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor + ?Sized + 'static> Runtime<E> {
    pub fn new(core: CoreRuntime, pools: Vec<Pool>, ctx: DispatchContext<E>) -> Self {
        let pools = pools
            .into_iter()
            .map(|p| (p.name.clone(), Arc::new(p)))
            .collect();
        Self {
            core,
            pools,
            ctx,
            in_flight: JoinSet::new(),
        }
    }

    /// Main loop.
    ///
    /// - Starts the pools the core releases.
    /// - Waits for whichever running pool finishes next.
    /// - Feeds the completion into the core and starts what it releases.
    ///
    /// Returns once every pool is in a terminal state and nothing is in
    /// flight. A failure never cancels pools that are already running.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(pools = self.pools.len(), "poolrun runtime started");

        let step = self.core.start();
        for command in step.commands {
            self.execute_command(command);
        }

        while let Some(joined) = self.in_flight.join_next().await {
            let event = match joined {
                Ok(event) => event,
                // The wrapper task never panics itself; this only fires if the
                // runtime is shutting down underneath us.
                Err(e) => return Err(anyhow!("pool task was cancelled: {e}").into()),
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running && self.in_flight.is_empty() {
                break;
            }
        }

        info!("runtime exiting");
        self.core.finish()
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::DispatchPools(pools) => self.spawn_ready(pools),
        }
    }

    fn spawn_ready(&mut self, scheduled: Vec<ScheduledPool>) {
        let names: Vec<_> = scheduled.iter().map(|p| p.name.as_str()).collect();
        debug!(?names, "spawning ready pools");

        for s in scheduled {
            let Some(pool) = self.pools.get(&s.name).cloned() else {
                // The scheduler only releases pools from the validated graph.
                let event = RuntimeEvent::PoolFinished {
                    result: Err(PoolrunError::PoolNotFound(s.name.clone())),
                    pool: s.name,
                };
                self.in_flight.spawn(async move { event });
                continue;
            };
            let ctx = self.ctx.clone();

            self.in_flight.spawn(async move {
                let name = pool.name.clone();
                // Run the pool on a nested task so a panic inside an executor
                // still reports back under this pool's name.
                let handle =
                    tokio::spawn(async move { run_pool(&pool, &s.inherited_location, &ctx).await });
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(anyhow!("pool '{name}' panicked: {e}").into()),
                };
                RuntimeEvent::PoolFinished { pool: name, result }
            });
        }
    }
}

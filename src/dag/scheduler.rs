use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::dag::graph::PoolGraph;
use crate::dag::pool::PoolRunState;
use crate::dag::scheduler_step::{ScheduledPool, SchedulerStep};
use crate::dag::state_manager::StateManager;
use crate::types::PoolName;

/// How a released pool ended, as reported back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOutcome {
    /// All tasks succeeded or were tolerated; `location` is what successors
    /// inherit.
    Succeeded { location: PathBuf },
    /// A critical task failed or the pool hit an infrastructure error.
    Failed,
}

/// Scheduler holds the immutable pool graph plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a pool is ready (every predecessor succeeded)
/// - threading locations from finished pools into their dependents
/// - blocking dependents of a failed pool
/// - latching an abort after the first failure so nothing new starts
///
/// It performs no IO; the async runtime feeds it completions.
#[derive(Debug)]
pub struct Scheduler {
    graph: PoolGraph,
    states: HashMap<PoolName, PoolRunState>,
    locations: HashMap<PoolName, PathBuf>,
    initial_location: PathBuf,
    /// Maximum number of pools in flight; `None` means unlimited.
    max_in_flight: Option<usize>,
    /// First pool that failed, if any. Once set, no new pool is released.
    first_failure: Option<PoolName>,
    started: bool,
}

impl Scheduler {
    pub fn new(
        graph: PoolGraph,
        initial_location: impl Into<PathBuf>,
        max_in_flight: Option<usize>,
    ) -> Self {
        let states = graph
            .pools()
            .map(|name| (name.to_string(), PoolRunState::Pending))
            .collect();

        Self {
            graph,
            states,
            locations: HashMap::new(),
            initial_location: initial_location.into(),
            max_in_flight: max_in_flight.map(|n| n.max(1)),
            first_failure: None,
            started: false,
        }
    }

    pub fn graph(&self) -> &PoolGraph {
        &self.graph
    }

    /// Read-only view of a pool's run state.
    pub fn state_of(&self, pool: &str) -> Option<PoolRunState> {
        self.states.get(pool).copied()
    }

    /// Location a finished pool handed to its successors.
    pub fn location_of(&self, pool: &str) -> Option<&Path> {
        self.locations.get(pool).map(PathBuf::as_path)
    }

    /// Whether a failure has stopped further dispatch.
    pub fn is_aborted(&self) -> bool {
        self.first_failure.is_some()
    }

    pub fn first_failure(&self) -> Option<&str> {
        self.first_failure.as_deref()
    }

    /// Returns `true` once every pool is terminal.
    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    /// Location a pool starts from.
    ///
    /// Roots start from the initial location; other pools inherit the
    /// location of their last declared predecessor.
    pub fn inherited_location(&self, pool: &str) -> PathBuf {
        match self.graph.predecessors_of(pool).last() {
            Some(pred) => self
                .locations
                .get(pred)
                .cloned()
                .unwrap_or_else(|| self.initial_location.clone()),
            None => self.initial_location.clone(),
        }
    }

    /// Release the initial set of ready pools.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;
        info!(pools = self.graph.len(), "scheduler: starting run");

        let newly_scheduled = self.release_ready();
        let run_just_finished = self.is_finished();

        SchedulerStep {
            newly_scheduled,
            run_just_finished,
            ..SchedulerStep::default()
        }
    }

    /// Record the outcome of a running pool and release whatever became ready.
    pub fn step_completion(&mut self, pool: &str, outcome: PoolOutcome) -> SchedulerStep {
        match self.states.get(pool) {
            Some(PoolRunState::Running) => {}
            Some(other) => {
                warn!(pool = %pool, state = ?other, "completion for pool that is not running; ignoring");
                return SchedulerStep::default();
            }
            None => {
                warn!(pool = %pool, "completion for unknown pool; ignoring");
                return SchedulerStep::default();
            }
        }

        let mut step = SchedulerStep::default();

        match outcome {
            PoolOutcome::Succeeded { location } => {
                debug!(pool = %pool, location = %location.display(), "pool finished");
                self.states.insert(pool.to_string(), PoolRunState::DoneSuccess);
                self.locations.insert(pool.to_string(), location);
            }
            PoolOutcome::Failed => {
                warn!(pool = %pool, "pool failed; blocking dependents and stopping dispatch");
                self.states.insert(pool.to_string(), PoolRunState::DoneFailed);
                if self.first_failure.is_none() {
                    self.first_failure = Some(pool.to_string());
                }

                let mut manager = StateManager::new(&self.graph, &mut self.states);
                step.newly_blocked = manager.mark_dependents_blocked(pool);
                step.newly_not_started = manager.mark_pending_not_started();
            }
        }

        step.newly_scheduled = self.release_ready();
        step.run_just_finished = self.is_finished();
        if step.run_just_finished {
            info!(aborted = self.is_aborted(), "scheduler: all pools terminal");
        }
        step
    }

    fn release_ready(&mut self) -> Vec<ScheduledPool> {
        if self.is_aborted() {
            return Vec::new();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.states);
        let slots = self
            .max_in_flight
            .map(|max| max.saturating_sub(manager.running_count()));
        let ready = manager.collect_new_ready_pools(slots);

        ready
            .into_iter()
            .map(|name| ScheduledPool {
                index: self.graph.index_of(&name).unwrap_or_default(),
                inherited_location: self.inherited_location(&name),
                name,
            })
            .collect()
    }

    /// Final per-pool states and locations, in declared order.
    pub fn summary(&self) -> Vec<(PoolName, PoolRunState, Option<PathBuf>)> {
        self.graph
            .pools()
            .map(|name| {
                (
                    name.to_string(),
                    self.state_of(name).unwrap_or(PoolRunState::Pending),
                    self.locations.get(name).cloned(),
                )
            })
            .collect()
    }
}

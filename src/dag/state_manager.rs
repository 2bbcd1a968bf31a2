// src/dag/state_manager.rs

//! Per-run state transitions for pools in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::dag::pool::PoolRunState;
use crate::dag::PoolGraph;
use crate::types::PoolName;

/// Manages per-run state transitions for pools.
pub struct StateManager<'a> {
    graph: &'a PoolGraph,
    states: &'a mut HashMap<PoolName, PoolRunState>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a PoolGraph, states: &'a mut HashMap<PoolName, PoolRunState>) -> Self {
        Self { graph, states }
    }

    /// Whether every predecessor of `pool` finished successfully.
    pub fn predecessors_succeeded(&self, pool: &str) -> bool {
        ReadOnlyStateManager::new(self.graph, self.states).predecessors_succeeded(pool)
    }

    /// Mark every pending transitive dependent of `failed` as `Blocked`.
    ///
    /// Returns the newly blocked pools in declared order.
    pub fn mark_dependents_blocked(&mut self, failed: &str) -> Vec<PoolName> {
        let mut newly_blocked = Vec::new();

        for name in self.graph.transitive_dependents_of(failed) {
            if let Some(state) = self.states.get_mut(&name) {
                if *state == PoolRunState::Pending {
                    *state = PoolRunState::Blocked;
                    debug!(pool = %name, upstream = %failed, "pool blocked by upstream failure");
                    newly_blocked.push(name);
                }
            }
        }

        newly_blocked
    }

    /// Mark every still-pending pool as `NotStarted`.
    pub fn mark_pending_not_started(&mut self) -> Vec<PoolName> {
        let mut skipped = Vec::new();
        for name in self.graph.pools() {
            if let Some(state) = self.states.get_mut(name) {
                if *state == PoolRunState::Pending {
                    *state = PoolRunState::NotStarted;
                    skipped.push(name.to_string());
                }
            }
        }
        if !skipped.is_empty() {
            debug!(?skipped, "run aborted; pending pools will not start");
        }
        skipped
    }

    /// Collect pending pools whose predecessors all succeeded, mark them
    /// `Running` and return them in declared order.
    ///
    /// At most `slots` pools are released; `None` means unlimited.
    pub fn collect_new_ready_pools(&mut self, slots: Option<usize>) -> Vec<PoolName> {
        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<PoolName> = self
            .graph
            .pools()
            .filter(|name| {
                self.states.get(*name) == Some(&PoolRunState::Pending)
                    && self.predecessors_succeeded(name)
            })
            .map(str::to_string)
            .take(slots.unwrap_or(usize::MAX))
            .collect();

        for name in &candidates {
            if let Some(state) = self.states.get_mut(name) {
                info!(pool = %name, "predecessors satisfied; releasing pool");
                *state = PoolRunState::Running;
            }
        }

        candidates
    }

    pub fn running_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == PoolRunState::Running)
            .count()
    }
}

/// A read-only view used when only shared access to the states is available.
pub struct ReadOnlyStateManager<'a> {
    graph: &'a PoolGraph,
    states: &'a HashMap<PoolName, PoolRunState>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(graph: &'a PoolGraph, states: &'a HashMap<PoolName, PoolRunState>) -> Self {
        Self { graph, states }
    }

    pub fn predecessors_succeeded(&self, pool: &str) -> bool {
        self.graph
            .predecessors_of(pool)
            .iter()
            .all(|pred| self.states.get(pred) == Some(&PoolRunState::DoneSuccess))
    }
}

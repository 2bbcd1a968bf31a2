// src/dag/pool.rs

//! Pools: ordered groups of tasks forming one stage of the pipeline.

use std::path::{Path, PathBuf};

use crate::dag::task::Task;
use crate::types::PoolName;

/// An ordered sequence of tasks plus the pools that must finish first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: PoolName,
    /// Execution order. Later tasks may rely on files written by earlier ones.
    pub tasks: Vec<Task>,
    /// Names of pools that must reach a terminal state before this one starts.
    pub predecessors: Vec<PoolName>,
}

impl Pool {
    pub fn new(name: impl Into<PoolName>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
            predecessors: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Declare `predecessor` as a pool that must finish first.
    ///
    /// Adding the same predecessor twice is a no-op.
    pub fn after(mut self, predecessor: impl Into<PoolName>) -> Self {
        self.add_predecessor(predecessor);
        self
    }

    pub fn add_predecessor(&mut self, predecessor: impl Into<PoolName>) {
        let predecessor = predecessor.into();
        if !self.predecessors.contains(&predecessor) {
            self.predecessors.push(predecessor);
        }
    }

    /// A pool without tasks is a valid pass-through.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Location the pool hands to its successors after a run from `inherited`.
    ///
    /// This is the output of the last task that declares one, with `{input}`
    /// threaded through the tasks in order; without declared outputs the
    /// inherited location passes through unchanged.
    pub fn resulting_location(&self, inherited: &Path) -> PathBuf {
        let mut current = inherited.to_path_buf();
        for task in &self.tasks {
            if let Some(out) = task.resolve(&current).output {
                current = out;
            }
        }
        current
    }
}

/// Per-run state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolRunState {
    /// Waiting for predecessors (or for a free slot in sequential mode).
    Pending,
    /// Tasks are being dispatched.
    Running,
    /// All tasks succeeded or were tolerated.
    DoneSuccess,
    /// A critical task failed, or the pool hit an infrastructure error.
    DoneFailed,
    /// Never started because a predecessor failed.
    Blocked,
    /// Never started because the run was aborted by an unrelated failure.
    NotStarted,
}

impl PoolRunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PoolRunState::Pending | PoolRunState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_passes_location_through() {
        let pool = Pool::new("gatk");
        assert!(pool.is_empty());
        assert_eq!(
            pool.resulting_location(Path::new("/r/5-DeDup/x.bam")),
            PathBuf::from("/r/5-DeDup/x.bam")
        );
    }

    #[test]
    fn resulting_location_follows_last_declared_output() {
        let pool = Pool::new("map")
            .with_task(Task::new("Index", ["bwa", "index"], "/r/idx"))
            .with_task(
                Task::new("Align", ["bwa", "aln", "{input}"], "/r/3").with_output("/r/3/a.bam"),
            )
            .with_task(
                Task::new("Sort", ["samtools", "sort", "{input}"], "/r/3")
                    .with_output("{input}.sorted.bam"),
            )
            .with_task(Task::new("Stats", ["samtools", "flagstat"], "/r/3"));

        assert_eq!(
            pool.resulting_location(Path::new("/in.fq")),
            PathBuf::from("/r/3/a.bam.sorted.bam")
        );
    }

    #[test]
    fn predecessors_are_deduplicated() {
        let pool = Pool::new("b").after("a").after("a");
        assert_eq!(pool.predecessors, vec!["a".to_string()]);
    }

    #[test]
    fn terminal_states() {
        assert!(!PoolRunState::Pending.is_terminal());
        assert!(!PoolRunState::Running.is_terminal());
        assert!(PoolRunState::DoneSuccess.is_terminal());
        assert!(PoolRunState::DoneFailed.is_terminal());
        assert!(PoolRunState::Blocked.is_terminal());
        assert!(PoolRunState::NotStarted.is_terminal());
    }
}

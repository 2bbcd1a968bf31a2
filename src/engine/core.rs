// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state
//! - a list of commands describing which pools the IO shell should start
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for spawning
//! pools and feeding their completions back. The core has no Tokio types
//! and performs no IO, so it can be unit tested directly.

use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::dag::{PoolOutcome, PoolRunState, ScheduledPool, Scheduler, SchedulerStep};
use crate::engine::{PoolReport, PoolSummary, RunSummary, RuntimeEvent};
use crate::errors::{PipelineError, PoolrunError, Result};
use crate::types::PoolName;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Start these pools.
    DispatchPools(Vec<ScheduledPool>),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep waiting for events.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    /// First failure observed; later failures are only logged.
    failure: Option<PoolrunError>,
    reports: HashMap<PoolName, PoolReport>,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            failure: None,
            reports: HashMap::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Release the initial pools.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start();
        self.to_core_step(step)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::PoolFinished { pool, result } => match result {
                Ok(report) => {
                    let location = report.location.clone();
                    self.reports.insert(pool.clone(), report);
                    let step = self
                        .scheduler
                        .step_completion(&pool, PoolOutcome::Succeeded { location });
                    self.to_core_step(step)
                }
                Err(err) => {
                    error!(pool = %pool, error = %err, "pool failed");
                    if self.failure.is_none() {
                        self.failure = Some(err);
                    }
                    let step = self.scheduler.step_completion(&pool, PoolOutcome::Failed);
                    for blocked in &step.newly_blocked {
                        warn!("{}", PipelineError::pool_blocked(blocked, &pool));
                    }
                    if !step.newly_not_started.is_empty() {
                        info!(pools = ?step.newly_not_started, "run aborted; these pools will not start");
                    }
                    self.to_core_step(step)
                }
            },
        }
    }

    fn to_core_step(&self, step: SchedulerStep) -> CoreStep {
        let mut commands = Vec::new();
        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchPools(step.newly_scheduled));
        }
        CoreStep {
            commands,
            keep_running: !self.scheduler.is_finished(),
        }
    }

    /// Consume the core, returning the first failure or a summary.
    pub fn finish(mut self) -> Result<RunSummary> {
        let pools: Vec<PoolSummary> = self
            .scheduler
            .summary()
            .into_iter()
            .map(|(name, state, location)| PoolSummary {
                report: self.reports.remove(&name),
                name,
                state,
                location,
            })
            .collect();

        let summary = RunSummary { pools };
        info!(
            succeeded = summary.count(PoolRunState::DoneSuccess),
            passed_through = summary.passed_through(),
            failed = summary.count(PoolRunState::DoneFailed),
            blocked = summary.count(PoolRunState::Blocked),
            not_started = summary.count(PoolRunState::NotStarted),
            "run finished"
        );

        match self.failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{Pool, PoolGraph};
    use std::path::PathBuf;

    fn core(pools: &[Pool]) -> CoreRuntime {
        CoreRuntime::new(Scheduler::new(PoolGraph::new(pools).unwrap(), "/in", None))
    }

    fn dispatched(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .flat_map(|CoreCommand::DispatchPools(p)| p.iter().map(|s| s.name.clone()))
            .collect()
    }

    fn finished(pool: &str, loc: &str) -> RuntimeEvent {
        RuntimeEvent::PoolFinished {
            pool: pool.to_string(),
            result: Ok(PoolReport {
                location: PathBuf::from(loc),
                tasks: Vec::new(),
            }),
        }
    }

    #[test]
    fn successful_chain_finishes_with_summary() {
        let mut c = core(&[Pool::new("a"), Pool::new("b").after("a")]);
        let step = c.start();
        assert_eq!(dispatched(&step), vec!["a"]);
        assert!(step.keep_running);

        let step = c.step(finished("a", "/a"));
        assert_eq!(dispatched(&step), vec!["b"]);

        let step = c.step(finished("b", "/b"));
        assert!(!step.keep_running);

        let summary = c.finish().unwrap();
        assert_eq!(summary.count(PoolRunState::DoneSuccess), 2);
        assert_eq!(summary.location_of("b"), Some(std::path::Path::new("/b")));
    }

    #[test]
    fn first_failure_is_returned_unchanged() {
        let mut c = core(&[
            Pool::new("a"),
            Pool::new("b").after("a"),
            Pool::new("c").after("b"),
        ]);
        c.start();
        c.step(finished("a", "/a"));

        let step = c.step(RuntimeEvent::PoolFinished {
            pool: "b".to_string(),
            result: Err(PipelineError::task_failed("b", "Align", "exit code 1").into()),
        });
        assert!(step.commands.is_empty());
        assert!(!step.keep_running);
        assert_eq!(c.scheduler().state_of("c"), Some(PoolRunState::Blocked));

        match c.finish() {
            Err(PoolrunError::Pipeline(e)) => assert_eq!(e.task_name(), Some("Align")),
            other => panic!("expected pipeline error, got {other:?}"),
        }
    }
}

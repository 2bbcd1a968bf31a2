// src/dag/mod.rs

//! Pipeline graph model and scheduling.
//!
//! - [`task`] holds the `Task` value: one external program invocation.
//! - [`pool`] holds `Pool`: an ordered group of tasks plus predecessors.
//! - [`graph`] validates the predecessor relation and keeps adjacency.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   pools are ready, blocked or never started.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod pool;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;

pub use graph::PoolGraph;
pub use pool::{Pool, PoolRunState};
pub use scheduler::{PoolOutcome, Scheduler};
pub use scheduler_step::{ScheduledPool, SchedulerStep};
pub use task::Task;

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running a task's external
//! program using `tokio::process::Command` and recording what happened.
//!
//! - [`runner`] supervises one process: environment, spawn, concurrent
//!   stream draining, timing and outcome classification.
//! - [`env`] builds the child's environment from overrides.
//! - [`log`] owns the append-only per-location run log.
//! - [`backend`] provides the `TaskExecutor` trait, implemented by
//!   `ProcessRunner` in production and by fakes in tests.

pub mod backend;
pub mod env;
pub mod log;
pub mod runner;

pub use backend::TaskExecutor;
pub use log::{RunLog, RunLogs};
pub use runner::{Outcome, ProcessRunner};

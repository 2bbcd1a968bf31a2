// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers:
//! - [`PipelineError`] is the *expected* failure value: a critical task
//!   failed, or a pool could not start because something upstream did.
//! - [`PoolrunError`] is the crate error enum. Infrastructure problems
//!   (log file I/O, marker creation, channel errors) land in `IoError` /
//!   `Other` and abort the run immediately.

use std::fmt;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::types::{PoolName, TaskName};

#[derive(Error, Debug)]
pub enum PoolrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Cycle detected in pool graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PoolrunError>;

impl PoolrunError {
    /// The pipeline failure carried by this error, if it is one.
    pub fn as_pipeline(&self) -> Option<&PipelineError> {
        match self {
            PoolrunError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

/// Where a [`PipelineError`] originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOrigin {
    /// A critical task failed (nonzero exit or launch failure).
    Task { pool: PoolName, task: TaskName },
    /// A pool was not started because `blocked_by` failed.
    Pool {
        pool: PoolName,
        blocked_by: PoolName,
    },
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureOrigin::Task { pool, task } => write!(f, "task '{task}' in pool '{pool}'"),
            FailureOrigin::Pool { pool, blocked_by } => {
                write!(f, "pool '{pool}' (blocked by pool '{blocked_by}')")
            }
        }
    }
}

/// A critical failure that halts further dispatch.
#[derive(Error, Debug, Clone)]
#[error(
    "{} failed in execution at {}: {}",
    .origin,
    .at.format("%Y-%m-%dT%H:%M:%S%.3f"),
    .message
)]
pub struct PipelineError {
    pub origin: FailureOrigin,
    pub at: DateTime<Local>,
    pub message: String,
}

impl PipelineError {
    pub fn task_failed(pool: &str, task: &str, message: impl Into<String>) -> Self {
        Self {
            origin: FailureOrigin::Task {
                pool: pool.to_string(),
                task: task.to_string(),
            },
            at: Local::now(),
            message: message.into(),
        }
    }

    pub fn pool_blocked(pool: &str, blocked_by: &str) -> Self {
        Self {
            origin: FailureOrigin::Pool {
                pool: pool.to_string(),
                blocked_by: blocked_by.to_string(),
            },
            at: Local::now(),
            message: "predecessor did not complete".to_string(),
        }
    }

    /// Name of the task that failed, if this error originated in a task.
    pub fn task_name(&self) -> Option<&str> {
        match &self.origin {
            FailureOrigin::Task { task, .. } => Some(task),
            FailureOrigin::Pool { .. } => None,
        }
    }

    /// Name of the pool the failure belongs to.
    pub fn pool_name(&self) -> &str {
        match &self.origin {
            FailureOrigin::Task { pool, .. } | FailureOrigin::Pool { pool, .. } => pool,
        }
    }
}

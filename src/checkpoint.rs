// src/checkpoint.rs

//! Completion markers: on-disk proof that a task already ran.
//!
//! A marker is a zero-byte file `DONE.<task-name>`. Only its existence
//! matters; readers ignore the content.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::dag::Task;
use crate::fs::{FileSystem, RealFileSystem};

pub const MARKER_PREFIX: &str = "DONE.";

/// Path of the marker for `task_name` in `folder`.
pub fn marker_path(folder: &Path, task_name: &str) -> PathBuf {
    folder.join(format!("{MARKER_PREFIX}{task_name}"))
}

/// Reads markers from a task's result folder and writes them into its
/// output folder.
#[derive(Debug, Clone)]
pub struct CompletionMarkers {
    fs: Arc<dyn FileSystem>,
}

impl Default for CompletionMarkers {
    fn default() -> Self {
        Self::on_disk()
    }
}

impl CompletionMarkers {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn on_disk() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }

    /// Whether `task` already completed for its result folder.
    pub fn has_completed(&self, task: &Task) -> bool {
        self.fs.exists(&marker_path(&task.result_folder, &task.name))
    }

    /// Record that `task` completed, returning the marker path.
    pub fn mark_completed(&self, task: &Task) -> Result<PathBuf> {
        let path = marker_path(&task.output_folder, &task.name);
        self.fs
            .write_atomic(&path, b"")
            .with_context(|| format!("creating completion marker for task '{}'", task.name))?;
        debug!(task = %task.name, marker = %path.display(), "completion marker written");
        Ok(path)
    }
}

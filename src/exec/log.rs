// src/exec/log.rs

//! Append-only run log, one file per working location.
//!
//! Format: UTF-8 text, informational lines unprefixed, captured stderr lines
//! prefixed with `#`, entries separated by a blank line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Prefix for lines captured from a child's standard error.
pub const STDERR_PREFIX: &str = "#";

/// Single writer for one log file.
///
/// The file is opened lazily on the first write, so a location that never
/// runs a task never gets a log. All writes go through one async mutex; a
/// call never interleaves with another call's lines.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: tokio::sync::Mutex<Option<File>>,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: tokio::sync::Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append lines as one uninterrupted block.
    pub async fn append_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<()> {
        let mut buf = String::new();
        for line in lines {
            buf.push_str(line.as_ref());
            buf.push('\n');
        }

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(buf.as_bytes())
                .await
                .with_context(|| format!("appending to log {}", self.path.display()))?;
            file.flush()
                .await
                .with_context(|| format!("flushing log {}", self.path.display()))?;
        }
        Ok(())
    }

    pub async fn append_line(&self, line: &str) -> Result<()> {
        self.append_lines(&[line]).await
    }

    /// Append a line captured from a child's standard error.
    pub async fn append_stderr_line(&self, line: &str) -> Result<()> {
        self.append_line(&format!("{STDERR_PREFIX}{line}")).await
    }

    /// Start a new entry: a blank separator line followed by `header`.
    pub async fn begin_entry(&self, header: &str) -> Result<()> {
        self.append_lines(&["", header]).await
    }

    async fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating log dir {}", parent.display()))?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening log {}", self.path.display()))
    }
}

/// Registry handing out one shared [`RunLog`] per folder.
///
/// Concurrent pools that write into the same folder share a writer.
#[derive(Debug)]
pub struct RunLogs {
    file_name: String,
    logs: Mutex<HashMap<PathBuf, Arc<RunLog>>>,
}

impl RunLogs {
    /// `run_name` names the pipeline run; the file is `<run_name>.log`.
    pub fn new(run_name: &str) -> Self {
        Self {
            file_name: format!("{run_name}.log"),
            logs: Mutex::new(HashMap::new()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the log for `folder`.
    pub fn path_for(&self, folder: &Path) -> PathBuf {
        folder.join(&self.file_name)
    }

    pub fn for_folder(&self, folder: &Path) -> Arc<RunLog> {
        let path = self.path_for(folder);
        let mut logs = self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        logs.entry(path.clone())
            .or_insert_with(|| Arc::new(RunLog::new(path)))
            .clone()
    }
}

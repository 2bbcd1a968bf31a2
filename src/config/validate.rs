// src/config/validate.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::model::{Pipeline, PoolConfig, RawPipelineFile, Settings, TaskConfig};
use crate::dag::task::INPUT_PLACEHOLDER;
use crate::dag::{Pool, PoolGraph, Task};
use crate::errors::{PoolrunError, Result};
use crate::types::EnvOverride;

impl TryFrom<RawPipelineFile> for Pipeline {
    type Error = PoolrunError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pipeline(&raw)?;

        let root = raw.settings.results_root.clone();
        let java_tmpdir = raw.settings.java_tmpdir;
        let pools: Vec<Pool> = raw
            .pool
            .iter()
            .map(|p| build_pool(p, &root, java_tmpdir))
            .collect();

        // Predecessors, self edges and cycles are checked on the built pools.
        PoolGraph::new(&pools)?;

        Ok(Pipeline {
            settings: Settings {
                run_name: raw.settings.run_name,
                results_root: root,
                input: raw.settings.input,
                parallel_pools: raw.settings.parallel_pools,
            },
            pools,
        })
    }
}

fn validate_raw_pipeline(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_pools(cfg)?;
    validate_settings(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_pools(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.pool.is_empty() {
        return Err(PoolrunError::ConfigError(
            "pipeline must contain at least one [[pool]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_settings(cfg: &RawPipelineFile) -> Result<()> {
    let name = cfg.settings.run_name.trim();
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(PoolrunError::ConfigError(format!(
            "[settings].run_name must be a plain file name (got '{}')",
            cfg.settings.run_name
        )));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawPipelineFile) -> Result<()> {
    // Markers are keyed by folder and task name, so two tasks with the same
    // name writing to the same folder would shadow each other.
    let mut seen: HashMap<(&Path, &str), &str> = HashMap::new();

    for pool in &cfg.pool {
        for task in &pool.task {
            let name = task.name.trim();
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(PoolrunError::ConfigError(format!(
                    "task name '{}' in pool '{}' must be a plain file name",
                    task.name, pool.name
                )));
            }
            if task.cmd.is_empty() || task.cmd[0].trim().is_empty() {
                return Err(PoolrunError::ConfigError(format!(
                    "task '{}' in pool '{}' has an empty `cmd`",
                    task.name, pool.name
                )));
            }
            let key = (task.output_folder.as_path(), task.name.as_str());
            if let Some(other) = seen.insert(key, pool.name.as_str()) {
                return Err(PoolrunError::ConfigError(format!(
                    "task '{}' in pool '{}' shares its name and output folder '{}' with a task in pool '{}'",
                    task.name,
                    pool.name,
                    task.output_folder.display(),
                    other
                )));
            }
        }
    }
    Ok(())
}

fn build_pool(cfg: &PoolConfig, root: &Path, java_tmpdir: bool) -> Pool {
    let mut pool = Pool::new(cfg.name.clone());
    for pred in &cfg.after {
        pool.add_predecessor(pred.clone());
    }
    for task in &cfg.task {
        pool.add_task(build_task(task, root, java_tmpdir));
    }
    pool
}

fn build_task(cfg: &TaskConfig, root: &Path, java_tmpdir: bool) -> Task {
    let output_folder = under_root(root, &cfg.output_folder);
    let result_folder = cfg
        .result_folder
        .as_ref()
        .map(|f| under_root(root, f))
        .unwrap_or_else(|| output_folder.clone());

    let mut task = Task::new(cfg.name.clone(), cfg.cmd.iter().cloned(), output_folder)
        .with_result_folder(result_folder);
    if !cfg.critical {
        task = task.non_critical();
    }
    if let Some(out) = &cfg.output {
        task = task.with_output(under_root(root, out));
    }
    for env in &cfg.env {
        task = task.with_env(env.clone());
    }
    if java_tmpdir {
        let env = EnvOverride::java_tmpdir(&task.output_folder);
        task = task.with_env(env);
    }
    task
}

/// Join a relative path onto the results root. Absolute paths and paths
/// built from the current location are left alone.
fn under_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.to_string_lossy().starts_with(INPUT_PLACEHOLDER) {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

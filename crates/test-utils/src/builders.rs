#![allow(dead_code)]

use std::path::PathBuf;

use poolrun::config::{Pipeline, PoolConfig, RawPipelineFile, SettingsSection, TaskConfig};
use poolrun::types::EnvOverride;

/// Builder for a validated `Pipeline` to simplify test setup.
pub struct PipelineBuilder {
    raw: RawPipelineFile,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawPipelineFile {
                settings: SettingsSection::default(),
                pool: Vec::new(),
            },
        }
    }

    pub fn results_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.raw.settings.results_root = root.into();
        self
    }

    pub fn run_name(mut self, name: &str) -> Self {
        self.raw.settings.run_name = name.to_string();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.raw.settings.parallel_pools = false;
        self
    }

    pub fn java_tmpdir(mut self) -> Self {
        self.raw.settings.java_tmpdir = true;
        self
    }

    pub fn with_pool(mut self, pool: PoolBuilder) -> Self {
        self.raw.pool.push(pool.build());
        self
    }

    pub fn raw(self) -> RawPipelineFile {
        self.raw
    }

    pub fn build(self) -> Pipeline {
        Pipeline::try_from(self.raw).expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `[[pool]]` entry.
pub struct PoolBuilder {
    pool: PoolConfig,
}

impl PoolBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            pool: PoolConfig {
                name: name.to_string(),
                after: vec![],
                task: vec![],
            },
        }
    }

    pub fn after(mut self, pred: &str) -> Self {
        self.pool.after.push(pred.to_string());
        self
    }

    pub fn task(mut self, task: TaskBuilder) -> Self {
        self.pool.task.push(task.build());
        self
    }

    pub fn build(self) -> PoolConfig {
        self.pool
    }
}

/// Builder for a `[[pool.task]]` entry.
pub struct TaskBuilder {
    task: TaskConfig,
}

impl TaskBuilder {
    pub fn new(name: &str, cmd: &[&str], output_folder: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                cmd: cmd.iter().map(|s| s.to_string()).collect(),
                output_folder: PathBuf::from(output_folder),
                result_folder: None,
                critical: true,
                output: None,
                env: vec![],
            },
        }
    }

    /// `sh -c <script>` task.
    pub fn shell(name: &str, script: &str, output_folder: &str) -> Self {
        Self::new(name, &["sh", "-c", script], output_folder)
    }

    pub fn result_folder(mut self, folder: &str) -> Self {
        self.task.result_folder = Some(PathBuf::from(folder));
        self
    }

    pub fn non_critical(mut self) -> Self {
        self.task.critical = false;
        self
    }

    pub fn output(mut self, output: &str) -> Self {
        self.task.output = Some(PathBuf::from(output));
        self
    }

    pub fn env(mut self, env: EnvOverride) -> Self {
        self.task.env.push(env);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

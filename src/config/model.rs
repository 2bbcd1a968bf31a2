// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::Pool;
use crate::types::EnvOverride;

/// Raw pipeline description as read from a TOML file.
///
/// ```toml
/// [settings]
/// run_name = "eager"
/// results_root = "results"
///
/// [[pool]]
/// name = "prep"
///
/// [[pool.task]]
/// name = "FastQC"
/// cmd = ["fastqc", "{input}", "-o", "0-FastQC"]
/// output_folder = "0-FastQC"
///
/// [[pool]]
/// name = "map"
/// after = ["prep"]
/// ```
///
/// Use [`Pipeline::try_from`] to validate it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    #[serde(default)]
    pub settings: SettingsSection,

    /// Pools in declared order.
    #[serde(default)]
    pub pool: Vec<PoolConfig>,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Each location's log file is `<run_name>.log`.
    #[serde(default = "default_run_name")]
    pub run_name: String,

    /// Base directory for relative task folders.
    #[serde(default = "default_results_root")]
    pub results_root: PathBuf,

    /// Initial location handed to pools without predecessors.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Whether pools without a predecessor relation may overlap.
    #[serde(default = "default_true")]
    pub parallel_pools: bool,

    /// Point the JVM temp dir of every task at `<output_folder>/.tmp`.
    #[serde(default)]
    pub java_tmpdir: bool,
}

fn default_run_name() -> String {
    "pipeline".to_string()
}

fn default_results_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            run_name: default_run_name(),
            results_root: default_results_root(),
            input: None,
            parallel_pools: true,
            java_tmpdir: false,
        }
    }
}

/// `[[pool]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub name: String,

    /// Pools that must succeed before this one starts. Order matters: the
    /// last entry decides the inherited location.
    #[serde(default)]
    pub after: Vec<String>,

    /// `[[pool.task]]` entries in execution order.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[[pool.task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    /// Program followed by its arguments. `{input}` is replaced by the
    /// pool's current location.
    pub cmd: Vec<String>,

    pub output_folder: PathBuf,

    /// Where to look for an earlier completion marker. Defaults to
    /// `output_folder`.
    #[serde(default)]
    pub result_folder: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub critical: bool,

    /// Location this task produces for later tasks and pools.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub env: Vec<EnvOverride>,
}

/// Run-wide settings after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub run_name: String,
    pub results_root: PathBuf,
    pub input: Option<PathBuf>,
    pub parallel_pools: bool,
}

/// Validated pipeline: settings plus fully built pools.
///
/// Obtain via `Pipeline::try_from(raw)` or `config::load_and_validate`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub settings: Settings,
    pub pools: Vec<Pool>,
}

impl Pipeline {
    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn task_count(&self) -> usize {
        self.pools.iter().map(|p| p.tasks.len()).sum()
    }
}

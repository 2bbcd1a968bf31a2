// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Pipeline, RawPipelineFile};
use crate::errors::Result;

/// Load a pipeline file from a given path and return the raw `RawPipelineFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (graph correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawPipelineFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a pipeline file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks for:
///   - empty pipelines and empty commands,
///   - unknown `after` references, self edges and cycles,
///   - task names colliding within one output folder.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Pipeline> {
    let raw = load_from_path(&path)?;
    let pipeline = Pipeline::try_from(raw)?;
    Ok(pipeline)
}

/// Pipeline file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Pipeline.toml")
}

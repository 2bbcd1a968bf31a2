// src/config/mod.rs

//! Pipeline description loading and validation for poolrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate it and build the pools (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{Pipeline, PoolConfig, RawPipelineFile, Settings, SettingsSection, TaskConfig};

// src/types.rs

//! Small value types shared across the engine.

use serde::Deserialize;

/// Canonical pool name type.
pub type PoolName = String;

/// Canonical task name type.
pub type TaskName = String;

/// How an [`EnvOverride`] combines with the inherited value of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvMode {
    /// Replace the inherited value (or set it if absent).
    #[default]
    Replace,
    /// Put the new value in front of the inherited one, joined by a separator.
    Prepend,
}

/// A single adjustment to a spawned process's environment.
///
/// Overrides never touch the engine's own environment; they are applied to a
/// copy of the base environment by [`crate::exec::env::build_environment`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvOverride {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub mode: EnvMode,
    /// Only used by [`EnvMode::Prepend`]. Defaults to a single space.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    " ".to_string()
}

impl EnvOverride {
    pub fn replace(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            mode: EnvMode::Replace,
            separator: default_separator(),
        }
    }

    pub fn prepend(
        name: impl Into<String>,
        value: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            mode: EnvMode::Prepend,
            separator: separator.into(),
        }
    }

    /// `JAVA_TOOL_OPTIONS` override pointing the JVM temp dir below `folder`.
    pub fn java_tmpdir(folder: &std::path::Path) -> Self {
        let tmp = folder.join(".tmp");
        Self::prepend(
            "JAVA_TOOL_OPTIONS",
            format!("-Djava.io.tmpdir={}", tmp.display()),
            " ",
        )
    }
}

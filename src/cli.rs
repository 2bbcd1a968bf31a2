// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `poolrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "poolrun",
    version,
    about = "Run a checkpointed pipeline of external programs, pool by pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Initial location handed to pools without predecessors.
    ///
    /// Overrides `[settings].input`.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `POOLRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the pool graph, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Run one pool at a time, in declared order.
    #[arg(long)]
    pub sequential: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["poolrun"]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert_eq!(args.config, PathBuf::from("Pipeline.toml"));
        assert!(args.input.is_none());
        assert!(!args.dry_run);
        assert!(!args.sequential);
    }

    #[test]
    fn all_flags() {
        let args = CliArgs::try_parse_from([
            "poolrun",
            "--config",
            "p.toml",
            "--input",
            "reads.fq",
            "--log-level",
            "debug",
            "--dry-run",
            "--sequential",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("reads.fq")));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run && args.sequential);
    }
}

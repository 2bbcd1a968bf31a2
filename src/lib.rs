// src/lib.rs

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::Pipeline;
use crate::dag::{PoolGraph, PoolOutcome, Scheduler};
use crate::engine::{Orchestrator, OrchestratorOptions, RunSummary};
use crate::errors::Result;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading and validation
/// - the orchestrator with the real process runner
///
/// Returns `Ok(None)` for a dry run.
pub async fn run(args: CliArgs) -> Result<Option<RunSummary>> {
    let pipeline = load_and_validate(&args.config)?;
    let input = initial_location(&args, &pipeline);

    if args.dry_run {
        print_dry_run(&pipeline, &input)?;
        return Ok(None);
    }

    let options = OrchestratorOptions {
        run_name: pipeline.settings.run_name.clone(),
        parallel_pools: pipeline.settings.parallel_pools && !args.sequential,
    };
    info!(
        config = %args.config.display(),
        pools = pipeline.pools.len(),
        tasks = pipeline.task_count(),
        "pipeline loaded"
    );

    let summary = Orchestrator::new(pipeline.pools, options).run(input).await?;
    Ok(Some(summary))
}

/// Process exit code for a finished run: 0 on success, 1 on any error.
pub fn exit_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// `--input`, then `[settings].input`, then the results root.
fn initial_location(args: &CliArgs, pipeline: &Pipeline) -> PathBuf {
    args.input
        .clone()
        .or_else(|| pipeline.settings.input.clone())
        .unwrap_or_else(|| pipeline.settings.results_root.clone())
}

/// Dry-run output: print pools, predecessors and commands, then the order
/// pools would be released in if every task succeeded.
fn print_dry_run(pipeline: &Pipeline, input: &std::path::Path) -> Result<()> {
    println!("poolrun dry-run");
    println!("  settings.run_name = {}", pipeline.settings.run_name);
    println!(
        "  settings.results_root = {}",
        pipeline.settings.results_root.display()
    );
    println!("  settings.parallel_pools = {}", pipeline.settings.parallel_pools);
    println!("  input = {}", input.display());
    println!();

    println!("pools ({}):", pipeline.pools.len());
    for pool in &pipeline.pools {
        println!("  - {}", pool.name);
        if !pool.predecessors.is_empty() {
            println!("      after: {:?}", pool.predecessors);
        }
        for task in &pool.tasks {
            println!("      * {}", task.name);
            println!("          cmd: {}", task.display_command());
            println!("          output_folder: {}", task.output_folder.display());
            if task.result_folder != task.output_folder {
                println!("          result_folder: {}", task.result_folder.display());
            }
            if !task.critical {
                println!("          critical: false");
            }
            if let Some(out) = &task.output {
                println!("          output: {}", out.display());
            }
            for env in &task.env {
                println!("          env: {} ({:?}) {}", env.name, env.mode, env.value);
            }
        }
    }

    println!();
    println!("release order (assuming success):");
    let mut scheduler = Scheduler::new(PoolGraph::new(&pipeline.pools)?, input, Some(1));
    let mut ready = scheduler.start().newly_scheduled;
    while let Some(next) = ready.pop() {
        let Some(pool) = pipeline.pool(&next.name) else {
            break;
        };
        let location = pool.resulting_location(&next.inherited_location);
        println!(
            "  - {} ({} -> {})",
            pool.name,
            next.inherited_location.display(),
            location.display()
        );
        ready.extend(
            scheduler
                .step_completion(&next.name, PoolOutcome::Succeeded { location })
                .newly_scheduled,
        );
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

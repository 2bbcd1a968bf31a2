// tests/process_runner.rs
#![cfg(unix)]

use poolrun::dag::Task;
use poolrun::exec::log::STDERR_PREFIX;
use poolrun::exec::{Outcome, ProcessRunner, RunLog};
use poolrun::types::EnvOverride;
use poolrun_test_utils::{init_tracing, read_or_empty, with_timeout};

fn sh(name: &str, script: &str, folder: &std::path::Path) -> Task {
    Task::new(name, ["sh", "-c", script], folder)
}

fn stderr_lines(log: &str) -> Vec<&str> {
    log.lines().filter(|l| l.starts_with(STDERR_PREFIX)).collect()
}

#[tokio::test]
async fn every_stderr_line_is_logged_once_with_prefix() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("run.log"));
    let task = sh(
        "Noisy",
        "for i in $(seq 1 300); do echo \"out $i\"; echo \"err $i\" >&2; done",
        dir.path(),
    );

    let outcome = with_timeout(ProcessRunner::quiet().execute(&task, &log)).await.unwrap();
    assert!(outcome.is_success());

    let content = read_or_empty(log.path());
    let lines = stderr_lines(&content);
    assert_eq!(lines.len(), 300);
    assert_eq!(lines[0], "#err 1");
    assert_eq!(lines[299], "#err 300");
    // stdout goes to the console, never to the log
    assert!(!content.contains("out 1"));
    assert!(content.contains("Running Noisy: sh -c"));
    assert!(content.contains("Runtime of task Noisy was: "));
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_stall_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("run.log"));
    // Well past a pipe buffer on each stream.
    let task = sh(
        "Flood",
        "seq 1 200000; seq 1 20000 >&2; seq 1 200000",
        dir.path(),
    );

    let outcome = with_timeout(ProcessRunner::quiet().execute(&task, &log)).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(stderr_lines(&read_or_empty(log.path())).len(), 20000);
}

#[tokio::test]
async fn nonzero_exit_is_an_outcome_with_a_failure_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("run.log"));
    let task = sh("Boom", "echo 'disk full' >&2; exit 3", dir.path());

    let outcome = ProcessRunner::quiet().execute(&task, &log).await.unwrap();

    assert!(matches!(outcome, Outcome::Failure { exit_code: Some(3), .. }));
    let content = read_or_empty(log.path());
    assert!(content.contains("#disk full"));
    assert!(content.contains("The task Boom failed in execution at "));
    assert!(!content.contains("Runtime of task Boom"));
}

#[tokio::test]
async fn missing_program_is_a_launch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("run.log"));
    let task = Task::new("Ghost", ["poolrun-no-such-program-xyz"], dir.path());

    let outcome = ProcessRunner::quiet().execute(&task, &log).await.unwrap();

    assert!(matches!(outcome, Outcome::LaunchFailure { .. }));
    assert!(read_or_empty(log.path()).contains("The task Ghost could not be launched at "));
}

#[tokio::test]
async fn env_overrides_reach_the_child_only() {
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("run.log"));
    let task = sh(
        "Env",
        "echo \"A=$POOLRUN_TEST_A\" >&2; echo \"J=$JAVA_TOOL_OPTIONS\" >&2",
        dir.path(),
    )
    .with_env(EnvOverride::replace("POOLRUN_TEST_A", "hello"))
    .with_env(EnvOverride::prepend("JAVA_TOOL_OPTIONS", "-Xmx1g", " "))
    .with_env(EnvOverride::java_tmpdir(dir.path()));

    let outcome = ProcessRunner::quiet().execute(&task, &log).await.unwrap();
    assert!(outcome.is_success());

    let content = read_or_empty(log.path());
    assert!(content.contains("#A=hello"));
    let tmp = dir.path().join(".tmp");
    assert!(content.contains(&format!("-Djava.io.tmpdir={}", tmp.display())));
    assert!(content.contains("-Xmx1g"));
    assert!(std::env::var("POOLRUN_TEST_A").is_err());
}

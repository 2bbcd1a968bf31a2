// tests/pool_ordering.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use poolrun::checkpoint::{CompletionMarkers, marker_path};
use poolrun::dag::{Pool, PoolRunState, Task};
use poolrun::engine::{Orchestrator, OrchestratorOptions, RunSummary};
use poolrun::errors::{PoolrunError, Result};
use poolrun::exec::log::RunLogs;
use poolrun::fs::mock::MockFileSystem;
use poolrun_test_utils::{ExecEvent, FakeExecutor, init_tracing, with_timeout};

fn options(parallel: bool) -> OrchestratorOptions {
    OrchestratorOptions {
        run_name: "run".to_string(),
        parallel_pools: parallel,
    }
}

fn task(name: &str, root: &Path) -> Task {
    Task::new(name, ["tool", "{input}"], root.join(name))
}

async fn run(
    pools: Vec<Pool>,
    fake: &FakeExecutor,
    parallel: bool,
    input: &Path,
) -> Result<RunSummary> {
    init_tracing();
    let orch = Orchestrator::with_executor(pools, options(parallel), Arc::new(fake.clone()));
    with_timeout(orch.run(input)).await
}

fn before(fake: &FakeExecutor, a: ExecEvent, b: ExecEvent) -> bool {
    match (fake.position(&a), fake.position(&b)) {
        (Some(x), Some(y)) => x < y,
        _ => false,
    }
}

#[tokio::test]
async fn dependent_declared_first_still_runs_after_its_predecessor() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().with_delay(Duration::from_millis(20));
    let pools = vec![
        Pool::new("B").after("A").with_task(task("b1", dir.path())),
        Pool::new("A").with_task(task("a1", dir.path())),
    ];

    let summary = run(pools, &fake, true, dir.path()).await.unwrap();

    assert_eq!(fake.executed(), vec!["a1", "b1"]);
    assert!(before(
        &fake,
        ExecEvent::Finished("a1".into()),
        ExecEvent::Started("b1".into())
    ));
    assert_eq!(summary.count(PoolRunState::DoneSuccess), 2);
}

#[tokio::test]
async fn tasks_within_a_pool_run_strictly_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().delay_task("t1", Duration::from_millis(30));
    let pools = vec![
        Pool::new("P")
            .with_task(task("t1", dir.path()))
            .with_task(task("t2", dir.path()))
            .with_task(task("t3", dir.path())),
    ];

    run(pools, &fake, true, dir.path()).await.unwrap();

    assert_eq!(fake.executed(), vec!["t1", "t2", "t3"]);
    assert!(before(
        &fake,
        ExecEvent::Finished("t1".into()),
        ExecEvent::Started("t2".into())
    ));
}

#[tokio::test]
async fn unrelated_pools_overlap_when_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().with_delay(Duration::from_millis(100));
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path())),
        Pool::new("B").with_task(task("b1", dir.path())),
    ];

    run(pools, &fake, true, dir.path()).await.unwrap();

    assert!(before(
        &fake,
        ExecEvent::Started("b1".into()),
        ExecEvent::Finished("a1".into())
    ));
}

#[tokio::test]
async fn unrelated_pools_run_in_declared_order_when_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().with_delay(Duration::from_millis(20));
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path())),
        Pool::new("B").with_task(task("b1", dir.path())),
    ];

    run(pools, &fake, false, dir.path()).await.unwrap();

    assert_eq!(
        fake.events(),
        vec![
            ExecEvent::Started("a1".into()),
            ExecEvent::Finished("a1".into()),
            ExecEvent::Started("b1".into()),
            ExecEvent::Finished("b1".into()),
        ]
    );
}

#[tokio::test]
async fn outputs_thread_through_tasks_and_empty_pools() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reads.fq");
    let fake = FakeExecutor::new();
    let pools = vec![
        Pool::new("prep").with_task(task("clip", dir.path()).with_output("{input}.clipped")),
        Pool::new("noop").after("prep"),
        Pool::new("map")
            .after("noop")
            .with_task(task("align", dir.path()).with_output("/r/aligned.bam"))
            .with_task(task("sort", dir.path())),
    ];

    let summary = run(pools, &fake, true, &input).await.unwrap();

    let clipped = format!("{}.clipped", input.display());
    assert_eq!(fake.task("clip").unwrap().command[1], input.display().to_string());
    assert_eq!(fake.task("align").unwrap().command[1], clipped);
    assert_eq!(fake.task("sort").unwrap().command[1], "/r/aligned.bam");

    assert_eq!(summary.location_of("noop"), Some(Path::new(&clipped)));
    assert_eq!(summary.location_of("map"), Some(Path::new("/r/aligned.bam")));
    assert_eq!(summary.passed_through(), 1);
}

#[tokio::test]
async fn fan_in_inherits_last_declared_predecessor() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new();
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path()).with_output("/from/a")),
        Pool::new("B").with_task(task("b1", dir.path()).with_output("/from/b")),
        Pool::new("C")
            .after("A")
            .after("B")
            .with_task(task("c1", dir.path())),
    ];

    run(pools, &fake, true, dir.path()).await.unwrap();

    assert_eq!(fake.task("c1").unwrap().command[1], "/from/b");
}

#[tokio::test]
async fn critical_failure_blocks_dependents_and_stops_unstarted_pools() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().fail("a1", 1);
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path())),
        Pool::new("B").after("A").with_task(task("b1", dir.path())),
        Pool::new("S").with_task(task("s1", dir.path())),
    ];

    let err = run(pools, &fake, false, dir.path()).await.unwrap_err();

    let pe = err.as_pipeline().expect("pipeline error");
    assert_eq!(pe.task_name(), Some("a1"));
    assert_eq!(fake.executed(), vec!["a1"]);
}

#[tokio::test]
async fn in_flight_pools_finish_after_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new()
        .fail("a1", 1)
        .delay_task("s1", Duration::from_millis(150));
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path())),
        Pool::new("S")
            .with_task(task("s1", dir.path()))
            .with_task(task("s2", dir.path())),
        Pool::new("T").after("S").with_task(task("t1", dir.path())),
    ];

    let err = run(pools, &fake, true, dir.path()).await.unwrap_err();

    assert!(matches!(err, PoolrunError::Pipeline(_)));
    // S was already running: it completes all its tasks.
    assert!(fake.position(&ExecEvent::Finished("s2".into())).is_some());
    // T was never started even though S succeeded.
    assert!(fake.task("t1").is_none());
}

#[tokio::test]
async fn tolerated_failure_lets_dependents_run() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new().fail("stats", 1);
    let pools = vec![
        Pool::new("A").with_task(task("stats", dir.path()).non_critical()),
        Pool::new("B").after("A").with_task(task("b1", dir.path())),
    ];

    let summary = run(pools, &fake, true, dir.path()).await.unwrap();

    assert_eq!(fake.executed(), vec!["stats", "b1"]);
    let report = summary.pool("A").unwrap().report.as_ref().unwrap();
    assert_eq!(report.tolerated(), 1);
}

#[tokio::test]
async fn invalid_graph_fails_before_anything_runs() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeExecutor::new();
    let pools = vec![
        Pool::new("A").after("B").with_task(task("a1", dir.path())),
        Pool::new("B").after("A").with_task(task("b1", dir.path())),
    ];

    let err = run(pools, &fake, true, dir.path()).await.unwrap_err();

    assert!(matches!(err, PoolrunError::DagCycle(_)));
    assert!(fake.executed().is_empty());
}

#[tokio::test]
async fn concurrent_pools_share_one_log_per_folder() {
    let dir = tempfile::tempdir().unwrap();
    let shared = dir.path().join("shared");
    let fake = FakeExecutor::new().with_delay(Duration::from_millis(10));
    let pools: Vec<Pool> = (0..4)
        .map(|i| {
            Pool::new(format!("P{i}"))
                .with_task(Task::new(format!("t{i}"), ["tool"], &shared))
        })
        .collect();

    run(pools, &fake, true, dir.path()).await.unwrap();

    let log = std::fs::read_to_string(RunLogs::new("run").path_for(&shared)).unwrap();
    let headers = log.lines().filter(|l| l.starts_with("Running t")).count();
    assert_eq!(headers, 4);
}

#[tokio::test]
async fn marker_that_cannot_be_written_aborts_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fs = MockFileSystem::new();
    fs.set_read_only(dir.path().join("a1"));
    let fake = FakeExecutor::new();
    let pools = vec![
        Pool::new("A").with_task(task("a1", dir.path())),
        Pool::new("B").after("A").with_task(task("b1", dir.path())),
    ];

    let orch = Orchestrator::with_executor(pools, options(true), Arc::new(fake.clone()))
        .with_markers(CompletionMarkers::new(Arc::new(fs.clone())));
    let err = with_timeout(orch.run(dir.path())).await.unwrap_err();

    assert!(err.to_string().contains("creating completion marker for task 'a1'"));
    assert!(err.as_pipeline().is_none());
    assert_eq!(fake.executed(), vec!["a1"]);
    assert!(fs.files().is_empty());
    assert!(!marker_path(&dir.path().join("a1"), "a1").exists());
}

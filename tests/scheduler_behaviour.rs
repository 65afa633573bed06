// tests/scheduler_behaviour.rs

mod common;
use crate::common::{init_tracing, SENSORS_CSV, SENSORS_PATH};

use std::error::Error;
use std::time::Duration;

use tokio::time::Instant;

use csv_collector::config::SourceSpec;
use csv_collector::engine::{RunOutcome, RunStage, Scheduler, SchedulerOptions};
use csv_collector::fs::mock::MockFileSystem;
use csv_collector_test_utils::builders::{sensors_source, SourceSpecBuilder};
use csv_collector_test_utils::{pipeline_with, FakeDatabase};

type TestResult = Result<(), Box<dyn Error>>;

const MINUTE: Duration = Duration::from_secs(60);

fn counter_source(name: &str, interval_minutes: u64) -> SourceSpec {
    SourceSpecBuilder::file(name, format!("/data/{name}.csv"))
        .skip_rows(1)
        .column(0, "ts", "DATE")
        .column(1, "val", "INT")
        .interval_minutes(interval_minutes)
        .build()
}

fn fs_with(names: &[&str]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    for name in names {
        fs.add_file(format!("/data/{name}.csv"), SENSORS_CSV);
    }
    fs
}

/// Let virtual time run until `table` has seen `count` inserts.
async fn wait_for_inserts(db: &FakeDatabase, table: &str, count: usize) {
    for _ in 0..3600 {
        if db.inserts_for(table).len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!(
        "{table} reached only {} inserts, wanted {count}",
        db.inserts_for(table).len()
    );
}

#[tokio::test]
async fn failing_source_does_not_affect_others() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SENSORS_PATH, SENSORS_CSV);
    let db = FakeDatabase::new().fail_create_for("broken");
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), SchedulerOptions::default());

    let sources = vec![
        sensors_source(SENSORS_PATH),
        SourceSpecBuilder::file("missing", "/data/missing.csv")
            .column(0, "a", "INT")
            .build(),
        SourceSpecBuilder::file("broken", SENSORS_PATH)
            .column(0, "a", "INT")
            .build(),
    ];

    let handle = scheduler.start(sources).await;
    let outcomes = handle.initial_outcomes();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes["sensors"].is_saved());
    assert!(matches!(
        outcomes["missing"],
        RunOutcome::Failed { stage: RunStage::Extracting, .. }
    ));
    assert!(matches!(
        outcomes["broken"],
        RunOutcome::Failed { stage: RunStage::Creating, .. }
    ));

    assert_eq!(db.inserts_for("sensors").len(), 1);
    assert!(!handle.has_periodic());
    handle.wait().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn interval_source_reruns_until_shutdown() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let fs = fs_with(&["once", "every5"]);
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), SchedulerOptions::default());
    let started = Instant::now();

    let handle = scheduler
        .start(vec![counter_source("once", 0), counter_source("every5", 5)])
        .await;

    assert_eq!(db.inserts_for("once").len(), 1);
    assert_eq!(db.inserts_for("every5").len(), 1);
    assert_eq!(handle.periodic_sources(), vec!["every5"]);

    wait_for_inserts(&db, "every5", 2).await;
    let first_tick = started.elapsed();
    assert!(first_tick >= 5 * MINUTE, "{first_tick:?}");
    assert!(first_tick < 6 * MINUTE, "{first_tick:?}");

    wait_for_inserts(&db, "every5", 3).await;
    assert!(started.elapsed() >= 10 * MINUTE);

    // the table is only created by the first run
    assert_eq!(db.count_for("every5", "CREATE TABLE"), 1);

    handle.shutdown().await;
    let stopped_at = db.inserts_for("every5").len();

    tokio::time::sleep(30 * MINUTE).await;

    assert_eq!(db.inserts_for("every5").len(), stopped_at);
    assert_eq!(db.inserts_for("once").len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelling_one_source_keeps_the_rest() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let fs = fs_with(&["fast", "slow"]);
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), SchedulerOptions::default());

    let handle = scheduler
        .start(vec![counter_source("fast", 1), counter_source("slow", 2)])
        .await;
    assert_eq!(handle.periodic_sources(), vec!["fast", "slow"]);

    assert!(handle.cancel("fast"));
    assert!(!handle.cancel("unknown"));

    wait_for_inserts(&db, "slow", 3).await;

    assert_eq!(db.inserts_for("fast").len(), 1);

    handle.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_token_stops_every_loop() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let fs = fs_with(&["a", "b"]);
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), SchedulerOptions::default());

    let handle = scheduler
        .start(vec![counter_source("a", 1), counter_source("b", 1)])
        .await;

    handle.shutdown_token().cancel();
    handle.wait().await;

    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(db.inserts_for("a").len(), 1);
    assert_eq!(db.inserts_for("b").len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ignore_intervals_runs_each_source_once() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let fs = fs_with(&["every5"]);
    let options = SchedulerOptions {
        ignore_intervals: true,
    };
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), options);

    let handle = scheduler.start(vec![counter_source("every5", 5)]).await;

    assert!(!handle.has_periodic());
    assert!(handle.initial_outcomes()["every5"].is_saved());

    tokio::time::sleep(20 * MINUTE).await;
    assert_eq!(db.inserts_for("every5").len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_interval_run_still_reschedules() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let fs = MockFileSystem::new();
    let scheduler = Scheduler::new(
        pipeline_with(fs.clone(), db.clone()),
        SchedulerOptions::default(),
    );

    let handle = scheduler.start(vec![counter_source("late", 1)]).await;

    assert!(matches!(
        handle.initial_outcomes()["late"],
        RunOutcome::Failed { stage: RunStage::Extracting, .. }
    ));
    assert_eq!(handle.periodic_sources(), vec!["late"]);
    assert!(db.inserts_for("late").is_empty());

    fs.add_file("/data/late.csv", SENSORS_CSV);

    wait_for_inserts(&db, "late", 2).await;

    handle.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn panicking_initial_run_keeps_its_schedule() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new().panic_once_on_insert_for("crashy");
    let fs = fs_with(&["crashy", "steady"]);
    let scheduler = Scheduler::new(pipeline_with(fs, db.clone()), SchedulerOptions::default());

    let handle = scheduler
        .start(vec![counter_source("crashy", 1), counter_source("steady", 0)])
        .await;
    let outcomes = handle.initial_outcomes();

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes["crashy"], RunOutcome::Aborted { .. }));
    assert!(outcomes["steady"].is_saved());
    assert_eq!(handle.periodic_sources(), vec!["crashy"]);

    wait_for_inserts(&db, "crashy", 1).await;

    handle.shutdown().await;
    Ok(())
}

// tests/pipeline.rs

mod common;
use crate::common::{init_tracing, SENSORS_CSV, SENSORS_PATH};

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use csv_collector::engine::{RunOutcome, RunStage};
use csv_collector::errors::CollectorError;
use csv_collector::fs::mock::MockFileSystem;
use csv_collector_test_utils::builders::sensors_source;
use csv_collector_test_utils::{pipeline_with, pipeline_with_timeout, DbCall, FakeDatabase};

type TestResult = Result<(), Box<dyn Error>>;

/// Counts events logged at INFO.
struct InfoCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for InfoCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::INFO {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn sensors_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(SENSORS_PATH, SENSORS_CSV);
    fs
}

#[tokio::test]
async fn missing_table_is_created_before_insert() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let pipeline = pipeline_with(sensors_fs(), db.clone());

    let report = pipeline.save(&sensors_source(SENSORS_PATH)).await?;

    assert!(report.table_created);
    assert_eq!(report.rows, 2);
    assert_eq!(report.affected, 2);

    assert_eq!(
        db.calls(),
        vec![
            DbCall::Query("SELECT * FROM sensors LIMIT 0".to_string()),
            DbCall::Execute {
                sql: "CREATE TABLE sensors (ts DATE, val INT)".to_string(),
                params: vec![],
            },
            DbCall::Execute {
                sql: "INSERT IGNORE INTO sensors (ts,val) VALUES (?,?),(?,?)".to_string(),
                params: vec![
                    "2024-01-01".to_string(),
                    "5".to_string(),
                    "2024-01-02".to_string(),
                    "7".to_string(),
                ],
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn run_that_creates_table_logs_one_info_line() {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(InfoCounter(Arc::clone(&count)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let db = FakeDatabase::new();
    let pipeline = pipeline_with(sensors_fs(), db.clone());

    let outcome = pipeline.run_and_report(&sensors_source(SENSORS_PATH)).await;

    assert!(outcome.is_saved());
    assert_eq!(db.count_for("sensors", "CREATE TABLE"), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn existing_table_is_not_recreated() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new().with_table("sensors");
    let pipeline = pipeline_with(sensors_fs(), db.clone());

    let report = pipeline.save(&sensors_source(SENSORS_PATH)).await?;

    assert!(!report.table_created);
    assert_eq!(db.count_for("sensors", "CREATE TABLE"), 0);
    assert_eq!(db.inserts_for("sensors").len(), 1);
    Ok(())
}

#[tokio::test]
async fn second_run_only_probes_and_inserts() -> TestResult {
    init_tracing();

    let db = FakeDatabase::new();
    let pipeline = pipeline_with(sensors_fs(), db.clone());
    let source = sensors_source(SENSORS_PATH);

    pipeline.save(&source).await?;
    let second = pipeline.save(&source).await?;

    assert!(!second.table_created);
    assert_eq!(db.count_for("sensors", "SELECT"), 2);
    assert_eq!(db.count_for("sensors", "CREATE TABLE"), 1);
    assert_eq!(db.inserts_for("sensors").len(), 2);
    Ok(())
}

#[tokio::test]
async fn source_file_removed_between_runs_fails_extraction() -> TestResult {
    init_tracing();

    let fs = sensors_fs();
    let db = FakeDatabase::new();
    let pipeline = pipeline_with(fs.clone(), db.clone());
    let source = sensors_source(SENSORS_PATH);

    pipeline.save(&source).await?;
    fs.remove_file(SENSORS_PATH);
    let err = pipeline.save(&source).await.unwrap_err();

    assert_eq!(err.stage, RunStage::Extracting);
    assert_eq!(db.inserts_for("sensors").len(), 1);
    Ok(())
}

#[tokio::test]
async fn no_rows_means_no_insert() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SENSORS_PATH, "header\n");
    let db = FakeDatabase::new().with_table("sensors");
    let pipeline = pipeline_with(fs, db.clone());

    let report = pipeline.save(&sensors_source(SENSORS_PATH)).await?;

    assert_eq!(report.rows, 0);
    assert_eq!(report.affected, 0);
    assert!(db.inserts_for("sensors").is_empty());
    Ok(())
}

#[tokio::test]
async fn create_failure_stops_the_run() {
    init_tracing();

    let db = FakeDatabase::new().fail_create_for("sensors");
    let pipeline = pipeline_with(sensors_fs(), db.clone());

    let err = pipeline.save(&sensors_source(SENSORS_PATH)).await.unwrap_err();

    assert_eq!(err.stage, RunStage::Creating);
    assert!(matches!(err.error, CollectorError::TableCreate { .. }));
    assert!(db.inserts_for("sensors").is_empty());
}

#[tokio::test]
async fn extraction_failure_keeps_its_cause() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SENSORS_PATH, "header\n2024-01-01\n");
    let db = FakeDatabase::new().with_table("sensors");
    let pipeline = pipeline_with(fs, db.clone());

    let err = pipeline.save(&sensors_source(SENSORS_PATH)).await.unwrap_err();

    assert_eq!(err.stage, RunStage::Extracting);
    match err.error {
        CollectorError::Extraction { source_name, source } => {
            assert_eq!(source_name, "sensors");
            assert!(matches!(*source, CollectorError::ColumnOutOfRange { row: 0, .. }));
        }
        other => panic!("expected Extraction, got {other:?}"),
    }
    assert!(db.inserts_for("sensors").is_empty());
}

#[tokio::test]
async fn insert_failure_is_reported_as_outcome() {
    init_tracing();

    let db = FakeDatabase::new().with_table("sensors").fail_insert_for("sensors");
    let pipeline = pipeline_with(sensors_fs(), db);

    let outcome = pipeline.run_and_report(&sensors_source(SENSORS_PATH)).await;

    match outcome {
        RunOutcome::Failed { stage, message } => {
            assert_eq!(stage, RunStage::Inserting);
            assert!(message.contains("insert refused"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_database_times_out() {
    init_tracing();

    let db = FakeDatabase::new()
        .with_table("sensors")
        .with_delay(Duration::from_secs(60));
    let pipeline = pipeline_with_timeout(sensors_fs(), db.clone(), Duration::from_secs(30));

    let err = pipeline.save(&sensors_source(SENSORS_PATH)).await.unwrap_err();

    // the probe timed out, so creation was attempted and timed out too
    assert_eq!(err.stage, RunStage::Creating);
    match err.error {
        CollectorError::TableCreate { source, .. } => {
            assert!(matches!(
                *source,
                CollectorError::Timeout { operation: "create table", .. }
            ));
        }
        other => panic!("expected TableCreate, got {other:?}"),
    }
    assert!(db.calls().is_empty());
}

pub mod builders;
pub mod fake_database;

use std::sync::{Arc, Once};
use std::time::Duration;

use csv_collector::engine::SavePipeline;
use csv_collector::extract::Extractor;
use csv_collector::fs::FileSystem;
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_database::{DbCall, FakeDatabase};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Save pipeline over `fs` and `db` with a 30 second operation timeout.
pub fn pipeline_with(fs: impl FileSystem + 'static, db: FakeDatabase) -> SavePipeline {
    pipeline_with_timeout(fs, db, Duration::from_secs(30))
}

pub fn pipeline_with_timeout(
    fs: impl FileSystem + 'static,
    db: FakeDatabase,
    timeout: Duration,
) -> SavePipeline {
    let extractor = Extractor::new(Arc::new(fs), Duration::from_secs(15))
        .expect("http client builds");
    SavePipeline::new(Arc::new(db), extractor, timeout)
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

#![allow(dead_code)]

pub use csv_collector_test_utils::init_tracing;

/// Input shared by the end-to-end tests: one header row, two data rows.
pub const SENSORS_CSV: &str = "header\n2024-01-01,5\n2024-01-02,7\n";

/// Path the mock filesystem serves `SENSORS_CSV` from.
pub const SENSORS_PATH: &str = "/data/sensors.csv";

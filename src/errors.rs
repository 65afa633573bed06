// src/errors.rs

//! Crate-wide error type.
//!
//! Configuration variants are process-fatal; everything else is scoped to a
//! single source run and only ever reaches the log.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("could not skip row at index {row}: {source}")]
    SkipRow {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("error at row index {row}: {source}")]
    CsvRead {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error(
        "error at row index {row}: cannot read column {column:?} at index {index}; row has only {len} fields"
    )]
    ColumnOutOfRange {
        row: usize,
        column: String,
        index: usize,
        len: usize,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("could not create table {table:?}: {source}")]
    TableCreate {
        table: String,
        #[source]
        source: Box<CollectorError>,
    },

    #[error("could not get csv records from source {source_name:?}: {source}")]
    Extraction {
        source_name: String,
        #[source]
        source: Box<CollectorError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CollectorError>;

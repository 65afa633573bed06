// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed raw model and the validated model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate devices, columns and connection info (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_config};
pub use model::{
    ColumnSpec, ConfigFile, CsvOptions, DbConnectionInfo, RawColumn, RawConfigFile,
    RawCsvOptions, RawDbInfo, RawDevice, Settings, SourceLocation, SourceSpec,
};

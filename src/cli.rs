// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `csv-collector`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "csv-collector",
    version,
    about = "Collect columns from CSV files or URLs into MySQL tables.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (JSON, or TOML with a `.toml` extension).
    #[arg(
        long,
        visible_alias = "configPath",
        value_name = "PATH",
        default_value_os_t = default_config_path()
    )]
    pub config: PathBuf,

    /// Append logs to this file instead of writing them to stderr.
    #[arg(long, visible_alias = "logPath", value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CSV_COLLECTOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Run every source once and exit, ignoring configured intervals.
    #[arg(long)]
    pub once: bool,

    /// Validate the config and print the statements per source without
    /// touching the database.
    #[arg(long)]
    pub dry_run: bool,
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

// src/lib.rs

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod fs;
pub mod logging;
pub mod sql;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::db::MySqlDatabase;
use crate::engine::{SavePipeline, Scheduler, SchedulerOptions};
use crate::extract::Extractor;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the MySQL pool
/// - extractor / save pipeline / scheduler
/// - Ctrl-C handling for interval sources
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let db = MySqlDatabase::connect(&cfg.db_info).await?;

    let extractor = Extractor::new(Arc::new(RealFileSystem), cfg.settings.fetch_timeout())?;
    let pipeline = SavePipeline::new(
        Arc::new(db.clone()),
        extractor,
        cfg.settings.operation_timeout(),
    );

    let options = SchedulerOptions {
        ignore_intervals: args.once,
    };
    let scheduler = Scheduler::new(pipeline, options);

    let handle = scheduler.start(cfg.sources).await;

    if handle.has_periodic() {
        info!(
            sources = ?handle.periodic_sources(),
            "periodic sources scheduled; running until Ctrl-C"
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
        handle.shutdown().await;
    }

    db.close().await;
    info!("csv-collector exiting");
    Ok(())
}

/// Simple dry-run output: print sources and the statements they would use.
fn print_dry_run(cfg: &ConfigFile) {
    println!("csv-collector dry-run");
    println!(
        "  database = {}@{}/{}",
        cfg.db_info.username,
        cfg.db_info.address(),
        cfg.db_info.database
    );
    println!(
        "  timeouts = operation {:?}, fetch {:?}",
        cfg.settings.operation_timeout(),
        cfg.settings.fetch_timeout()
    );
    println!();

    println!("sources ({}):", cfg.sources.len());
    for source in cfg.sources.iter() {
        println!("  - {}", source.name);
        println!("      from: {}", source.location);
        if source.interval_minutes > 0 {
            println!("      every: {} min", source.interval_minutes);
        }
        if source.csv.skip_rows > 0 {
            println!("      skip_rows: {}", source.csv.skip_rows);
        }
        if source.csv.delimiter != b',' {
            println!("      delimiter: {:?}", source.csv.delimiter as char);
        }
        println!("      create: {}", sql::create_table_statement(source));
        if let Some(insert) = sql::insert_statement(source, 1) {
            println!("      insert: {insert}");
        }
    }

    debug!("dry-run complete (no database access)");
}

// src/engine/mod.rs

//! Orchestration engine.
//!
//! Per source the run moves through
//! `Probing -> (Creating) -> Extracting -> Inserting`, then back to idle.
//! Interval sources idle until their next tick; one-shot sources are done.
//! A failure in any stage is logged and ends only that run.
//!
//! The per-source steps live in [`pipeline`]; concurrent dispatch and the
//! periodic loops in [`scheduler`].

use std::fmt;

/// Canonical source name type used throughout the engine. Doubles as the
/// destination table name.
pub type SourceName = String;

/// Step of a single source run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Probing,
    Creating,
    Extracting,
    Inserting,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::Probing => "probe",
            RunStage::Creating => "create table",
            RunStage::Extracting => "extraction",
            RunStage::Inserting => "insert",
        };
        f.write_str(s)
    }
}

/// Result of one run of one source, as reported to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Saved(SaveReport),
    Failed { stage: RunStage, message: String },
    /// The run's task panicked or was cancelled before it could report.
    Aborted { message: String },
}

impl RunOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, RunOutcome::Saved(_))
    }
}

/// Options for the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerOptions {
    /// Run every source once and never start periodic loops (`--once`).
    pub ignore_intervals: bool,
}

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{SavePipeline, SaveReport, StageError};
pub use scheduler::{Scheduler, SchedulerHandle};

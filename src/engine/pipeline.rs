// src/engine/pipeline.rs

//! Per-source save pipeline: probe / create, extract, insert.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::SourceSpec;
use crate::db::Database;
use crate::errors::{CollectorError, Result};
use crate::extract::Extractor;
use crate::sql::{create_table_statement, insert_statement, probe_statement};

use super::{RunOutcome, RunStage};

/// What one successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Rows read from the source after skipping.
    pub rows: usize,
    /// Rows the database reported as inserted (duplicates are ignored).
    pub affected: u64,
    /// Whether the table had to be created first.
    pub table_created: bool,
}

/// A failed run, tagged with the step it failed in.
#[derive(Debug)]
pub struct StageError {
    pub stage: RunStage,
    pub error: CollectorError,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageError {}

/// Runs the save pipeline for one source at a time.
///
/// Cheap to share: the database handle is an `Arc` over a pool and the
/// extractor clones its HTTP client handle.
pub struct SavePipeline {
    db: Arc<dyn Database>,
    extractor: Extractor,
    timeout: Duration,
}

impl fmt::Debug for SavePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavePipeline")
            .field("extractor", &self.extractor)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SavePipeline {
    /// `timeout` bounds every database round-trip and the extraction step
    /// individually.
    pub fn new(db: Arc<dyn Database>, extractor: Extractor, timeout: Duration) -> Self {
        Self {
            db,
            extractor,
            timeout,
        }
    }

    /// Run the pipeline and log the result: one line per run.
    ///
    /// Never fails; errors are reported and returned as [`RunOutcome::Failed`].
    pub async fn run_and_report(&self, source: &SourceSpec) -> RunOutcome {
        match self.save(source).await {
            Ok(report) => {
                info!(
                    source = %source.name,
                    rows = report.rows,
                    inserted = report.affected,
                    table_created = report.table_created,
                    "saved source data successfully"
                );
                RunOutcome::Saved(report)
            }
            Err(err) => {
                error!(
                    source = %source.name,
                    stage = %err.stage,
                    error = %err.error,
                    "could not save data for source"
                );
                RunOutcome::Failed {
                    stage: err.stage,
                    message: err.error.to_string(),
                }
            }
        }
    }

    /// Probe / create the table, extract, then insert in one batch.
    pub async fn save(&self, source: &SourceSpec) -> std::result::Result<SaveReport, StageError> {
        let table_created = self.ensure_table(source).await?;

        debug!(source = %source.name, location = %source.location, "extracting");
        let extracted = self
            .bounded("extraction", self.extractor.extract(source))
            .await
            .map_err(|e| CollectorError::Extraction {
                source_name: source.name.clone(),
                source: Box::new(e),
            })
            .map_err(at(RunStage::Extracting))?;

        let rows = extracted.row_count();
        let Some(sql) = insert_statement(source, rows) else {
            debug!(source = %source.name, "no rows to insert");
            return Ok(SaveReport {
                rows,
                affected: 0,
                table_created,
            });
        };

        debug!(source = %source.name, rows, params = extracted.values.len(), "inserting");
        let affected = self
            .bounded("insert", self.db.execute(&sql, &extracted.values))
            .await
            .map_err(at(RunStage::Inserting))?;

        Ok(SaveReport {
            rows,
            affected,
            table_created,
        })
    }

    /// Returns `true` when the table was created by this call.
    ///
    /// Any probe failure, not just "table does not exist", leads to a create
    /// attempt. A create failure ends the run.
    async fn ensure_table(&self, source: &SourceSpec) -> std::result::Result<bool, StageError> {
        let probe = probe_statement(source);
        debug!(source = %source.name, stage = %RunStage::Probing, "probing table");
        match self.bounded("table probe", self.db.query(&probe)).await {
            Ok(()) => Ok(false),
            Err(probe_err) => {
                debug!(
                    source = %source.name,
                    error = %probe_err,
                    "table probe failed; creating table"
                );
                let create = create_table_statement(source);
                self.bounded("create table", self.db.execute(&create, &[]))
                    .await
                    .map_err(|e| CollectorError::TableCreate {
                        table: source.name.clone(),
                        source: Box::new(e),
                    })
                    .map_err(at(RunStage::Creating))?;
                debug!(source = %source.name, "created table");
                Ok(true)
            }
        }
    }

    /// Apply the per-operation deadline. Dropping the future on expiry
    /// cancels the in-flight operation.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| CollectorError::Timeout {
                operation,
                after: self.timeout,
            })?
    }
}

fn at(stage: RunStage) -> impl FnOnce(CollectorError) -> StageError {
    move |error| StageError { stage, error }
}

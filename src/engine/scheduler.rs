// src/engine/scheduler.rs

//! Fan-out of source runs and the periodic re-run loops.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{Id, JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SourceSpec;

use super::pipeline::SavePipeline;
use super::{RunOutcome, SchedulerOptions, SourceName};

/// Dispatches every source concurrently and keeps interval sources running.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pipeline: Arc<SavePipeline>,
    options: SchedulerOptions,
}

/// A running periodic loop for one source.
#[derive(Debug)]
struct PeriodicTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new(pipeline: SavePipeline, options: SchedulerOptions) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            options,
        }
    }

    /// Run every source once, concurrently, and wait for all of them.
    ///
    /// As soon as an interval source's first run finishes, its periodic loop
    /// is started; the first re-run fires one full interval later. The
    /// returned handle owns those loops.
    pub async fn start(&self, sources: Vec<SourceSpec>) -> SchedulerHandle {
        let shutdown = CancellationToken::new();
        let mut initial = JoinSet::new();
        let mut pending: HashMap<Id, SourceSpec> = HashMap::with_capacity(sources.len());

        info!(sources = sources.len(), "starting initial runs");

        for source in sources {
            let pipeline = Arc::clone(&self.pipeline);
            let task_source = source.clone();
            let task = initial.spawn(async move { pipeline.run_and_report(&task_source).await });
            pending.insert(task.id(), source);
        }

        let mut periodic = BTreeMap::new();
        let mut outcomes = BTreeMap::new();

        while let Some(joined) = initial.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    let id = e.id();
                    let name = pending.get(&id).map(|s| s.name.as_str()).unwrap_or("?");
                    error!(source = %name, error = %e, "source task did not complete");
                    (
                        id,
                        RunOutcome::Aborted {
                            message: e.to_string(),
                        },
                    )
                }
            };

            let Some(source) = pending.remove(&id) else {
                continue;
            };

            if !self.options.ignore_intervals {
                if let Some(period) = source.interval() {
                    let cancel = shutdown.child_token();
                    let name = source.name.clone();
                    let handle = spawn_periodic(
                        Arc::clone(&self.pipeline),
                        source.clone(),
                        period,
                        cancel.clone(),
                    );
                    periodic.insert(name, PeriodicTask { cancel, handle });
                }
            }

            outcomes.insert(source.name, outcome);
        }

        info!(periodic = periodic.len(), "initial runs finished");

        SchedulerHandle {
            shutdown,
            periodic,
            outcomes,
        }
    }
}

/// Re-run `source` every `period` until `cancel` fires.
///
/// Runs never overlap: a slow run pushes the next tick back instead of
/// bursting to catch up.
fn spawn_periodic(
    pipeline: Arc<SavePipeline>,
    source: SourceSpec,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    info!(source = %source.name, ?period, "scheduling periodic runs");

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            debug!(source = %source.name, "periodic run");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = pipeline.run_and_report(&source) => {}
            }
        }

        debug!(source = %source.name, "periodic loop stopped");
    })
}

/// Owns the periodic loops started by [`Scheduler::start`].
///
/// Dropping the handle leaves the loops running; call [`shutdown`] to stop
/// them.
///
/// [`shutdown`]: SchedulerHandle::shutdown
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: CancellationToken,
    periodic: BTreeMap<SourceName, PeriodicTask>,
    outcomes: BTreeMap<SourceName, RunOutcome>,
}

impl SchedulerHandle {
    /// Result of each source's initial run.
    pub fn initial_outcomes(&self) -> &BTreeMap<SourceName, RunOutcome> {
        &self.outcomes
    }

    pub fn has_periodic(&self) -> bool {
        !self.periodic.is_empty()
    }

    /// Names of sources with a periodic loop, sorted.
    pub fn periodic_sources(&self) -> Vec<&str> {
        self.periodic.keys().map(String::as_str).collect()
    }

    /// Token that stops every periodic loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop one source's periodic loop. Returns `false` for unknown names.
    pub fn cancel(&self, name: &str) -> bool {
        match self.periodic.get(name) {
            Some(task) => {
                info!(source = %name, "cancelling periodic runs");
                task.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Broadcast shutdown and wait for every loop to stop.
    pub async fn shutdown(self) {
        info!("shutting down periodic runs");
        self.shutdown.cancel();
        self.wait().await;
    }

    /// Wait for every periodic loop to end. Only returns once they have all
    /// been cancelled.
    pub async fn wait(self) {
        for (name, task) in self.periodic {
            if let Err(e) = task.handle.await {
                error!(source = %name, error = %e, "periodic task ended abnormally");
            }
        }
    }
}

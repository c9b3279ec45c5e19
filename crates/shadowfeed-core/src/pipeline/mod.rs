//! Pipeline orchestrator.
//!
//! Collectors run one after another until every candidate is known. The
//! candidates are then fed through a bounded queue to a fixed pool of workers,
//! each running normalize → dedup → resolve → re-dedup → enrich and sending
//! exactly one [`Outcome`] back. Once every outcome is in, records are
//! appended to the store in a single batch.

mod claims;
mod outcome;
mod stats;
mod worker;

pub use claims::RuntimeClaims;
pub use outcome::{DuplicateKind, FilterStage, Outcome};
pub use stats::RunStats;

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::collect::{Candidate, Collector};
use crate::enrich::Enricher;
use crate::redirect::RedirectResolver;
use crate::store::{RecordStore, StoreError};
use crate::url_model::Allowlist;
use worker::WorkerContext;

const PROGRESS_EVERY: usize = 100;

pub struct Pipeline {
    allowlist: Arc<Allowlist>,
    resolver: Arc<RedirectResolver>,
    enricher: Arc<Enricher>,
    workers: usize,
    queue_capacity: usize,
}

impl Pipeline {
    pub fn new(allowlist: Allowlist, resolver: RedirectResolver, enricher: Enricher) -> Self {
        Self {
            allowlist: Arc::new(allowlist),
            resolver: Arc::new(resolver),
            enricher: Arc::new(enricher),
            workers: 20,
            queue_capacity: 100,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Full run: collect, process, append once, report.
    ///
    /// Only a store failure is an error; everything else is counted in the stats.
    pub async fn run(
        &self,
        collectors: &[Box<dyn Collector>],
        store: Arc<RwLock<RecordStore>>,
    ) -> Result<RunStats, StoreError> {
        let mut stats = RunStats::default();
        let candidates = collect_candidates(collectors, &mut stats).await;
        stats.raw_items = candidates.len();

        let outcomes = self.process(candidates, Arc::clone(&store)).await;
        let mut records = Vec::new();
        for outcome in outcomes {
            stats.record(&outcome);
            if let Outcome::Record(r) = outcome {
                records.push(r);
            }
        }

        stats.written_to_db = store.write().await.append(&records)?;
        tracing::info!(
            raw = stats.raw_items,
            filtered = stats.filtered_items,
            written = stats.written_to_db,
            "run complete"
        );
        Ok(stats)
    }

    /// Runs every candidate through the worker pool and returns one outcome per
    /// candidate, in completion order.
    pub async fn process(
        &self,
        candidates: Vec<Candidate>,
        store: Arc<RwLock<RecordStore>>,
    ) -> Vec<Outcome> {
        let total = candidates.len();
        if total == 0 {
            return Vec::new();
        }
        let ctx = Arc::new(WorkerContext {
            allowlist: Arc::clone(&self.allowlist),
            resolver: Arc::clone(&self.resolver),
            enricher: Arc::clone(&self.enricher),
            claims: RuntimeClaims::new(),
            store,
        });

        let (job_tx, job_rx) = mpsc::channel::<Candidate>(self.queue_capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<Outcome>(self.queue_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut pool = tokio::task::JoinSet::new();
        for _ in 0..self.workers.min(total) {
            let ctx = Arc::clone(&ctx);
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            pool.spawn(async move {
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some(candidate) = next else {
                        break;
                    };
                    let outcome = worker::process_candidate(&ctx, candidate).await;
                    if results.send(outcome).await.is_err() {
                        break;
                    }
                }
            });
        }
        // Only workers hold the queue ends now, so a dead pool cannot wedge the feeder.
        drop(result_tx);
        drop(job_rx);

        let feeder = tokio::spawn(async move {
            for candidate in candidates {
                if job_tx.send(candidate).await.is_err() {
                    break;
                }
            }
        });

        let mut outcomes = Vec::with_capacity(total);
        while outcomes.len() < total {
            let Some(outcome) = result_rx.recv().await else {
                break;
            };
            outcomes.push(outcome);
            if outcomes.len() % PROGRESS_EVERY == 0 {
                tracing::info!("processed {}/{}", outcomes.len(), total);
            }
        }

        while let Some(res) = pool.join_next().await {
            if let Err(e) = res {
                tracing::warn!("pipeline worker task failed: {}", e);
            }
        }
        if let Err(e) = feeder.await {
            tracing::warn!("candidate feeder task failed: {}", e);
        }
        if outcomes.len() < total {
            tracing::warn!(
                missing = total - outcomes.len(),
                "some candidates produced no outcome"
            );
        }
        outcomes
    }
}

/// Runs collectors sequentially. A failing collector is logged and skipped.
pub async fn collect_candidates(
    collectors: &[Box<dyn Collector>],
    stats: &mut RunStats,
) -> Vec<Candidate> {
    let mut all = Vec::new();
    for collector in collectors {
        tracing::info!(collector = collector.name(), "collecting");
        match collector.collect().await {
            Ok(found) => all.extend(found),
            Err(e) => {
                stats.collector_failures += 1;
                tracing::warn!(collector = collector.name(), "collector failed: {}", e);
            }
        }
    }
    all
}

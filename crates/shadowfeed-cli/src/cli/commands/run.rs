//! `shadowfeed run` – one full ingest: collect, process, persist, report.

use anyhow::{Context, Result};
use shadowfeed_core::collect::{self, CurlTransport, HttpTransport, SourceKind};
use shadowfeed_core::config::FeedConfig;
use shadowfeed_core::enrich::{DnsHostLookup, Enricher};
use shadowfeed_core::pipeline::Pipeline;
use shadowfeed_core::redirect::{CurlFollower, RedirectResolver};
use shadowfeed_core::store::RecordStore;
use shadowfeed_core::url_model::Allowlist;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Command-line overrides for a run; `None`/empty falls back to config.
#[derive(Debug, Default)]
pub struct IngestArgs {
    pub workers: Option<usize>,
    pub db: Option<PathBuf>,
    pub allowlist: Option<PathBuf>,
    pub stats_out: Option<PathBuf>,
    pub sources: Vec<SourceKind>,
}

pub async fn run_ingest(cfg: &FeedConfig, args: IngestArgs) -> Result<()> {
    let db_path = match args.db {
        Some(p) => p,
        None => cfg.resolved_db_path()?,
    };
    let stats_path = match args.stats_out {
        Some(p) => p,
        None => cfg.resolved_stats_path()?,
    };
    let allowlist = match args.allowlist.or_else(|| cfg.allowlist_path.clone()) {
        Some(path) => Allowlist::load(&path)?,
        None => Allowlist::empty(),
    };

    // Open the store before collecting: a corrupt log should stop us before any network work.
    let store = RecordStore::open(&db_path)?;
    tracing::info!(
        known = store.len(),
        allowlisted = allowlist.len(),
        "starting ingest into {}",
        db_path.display()
    );
    let store = Arc::new(RwLock::new(store));

    let transport: Arc<dyn HttpTransport> =
        Arc::new(CurlTransport::new(cfg.http_timeout(), cfg.user_agent.clone()));
    let github_token = std::env::var("GITHUB_TOKEN").ok();
    let collectors = collect::from_config(&cfg.sources(), &args.sources, transport, github_token);

    let follower = Arc::new(CurlFollower::new(cfg.max_redirects, cfg.user_agent.clone()));
    let resolver = RedirectResolver::new(follower, cfg.http_timeout());
    let enricher = Enricher::new(Arc::new(DnsHostLookup::from_system_conf()), cfg.scoring());
    let pipeline = Pipeline::new(allowlist, resolver, enricher)
        .with_workers(args.workers.unwrap_or(cfg.workers))
        .with_queue_capacity(cfg.queue_capacity);

    let stats = pipeline
        .run(&collectors, store)
        .await
        .context("ingest run aborted")?;
    stats.write_json(&stats_path)?;

    println!(
        "raw: {}  filtered: {}  written: {}",
        stats.raw_items, stats.filtered_items, stats.written_to_db
    );
    if stats.collector_failures > 0 {
        println!("{} collector(s) failed; see log", stats.collector_failures);
    }
    println!("stats: {}", stats_path.display());
    Ok(())
}

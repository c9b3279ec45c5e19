//! Integration test: full orchestrator runs over a temp record store.
//!
//! Collectors and DNS are in-memory; the store is the real CSV log.

mod common;

use common::fakes::{FakeDns, FixedCollector, NoNetwork};
use shadowfeed_core::collect::{Candidate, Collector};
use shadowfeed_core::config::ScoringConfig;
use shadowfeed_core::enrich::Enricher;
use shadowfeed_core::pipeline::{DuplicateKind, Outcome, Pipeline};
use shadowfeed_core::redirect::RedirectResolver;
use shadowfeed_core::store::RecordStore;
use shadowfeed_core::url_model::Allowlist;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::RwLock;

fn pipeline(dns: Arc<FakeDns>, allowlist: Allowlist, workers: usize) -> Pipeline {
    let resolver = RedirectResolver::new(Arc::new(NoNetwork), Duration::from_secs(1));
    let enricher = Enricher::new(dns, ScoringConfig::default());
    Pipeline::new(allowlist, resolver, enricher)
        .with_workers(workers)
        .with_queue_capacity(16)
}

/// 1000 candidates over 200 distinct domains, each repeated five times with
/// cosmetic variations that normalize to the same key.
fn repeated_candidates() -> Vec<Candidate> {
    let mut out = Vec::with_capacity(1000);
    for round in 0..5 {
        for i in 0..200 {
            let raw = match round {
                0 => format!("https://tool{}.example.org", i),
                1 => format!("http://www.tool{}.example.org/", i),
                2 => format!("https://tool{}.example.org/pricing?ref=hn", i),
                3 => format!("TOOL{}.example.org", i),
                _ => format!("https://tool{}.example.org/#top", i),
            };
            out.push(Candidate::new("Hacker News", raw));
        }
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_outcome_per_distinct_url_for_any_pool_size() {
    for workers in [1, 4, 20] {
        let dir = tempdir().unwrap();
        let store = Arc::new(RwLock::new(RecordStore::open(dir.path().join("db.csv")).unwrap()));
        let dns = Arc::new(FakeDns::default());
        let p = pipeline(Arc::clone(&dns), Allowlist::empty(), workers);

        let outcomes = p.process(repeated_candidates(), store).await;
        assert_eq!(outcomes.len(), 1000, "workers={workers}");
        let non_duplicate = outcomes.iter().filter(|o| !o.is_duplicate()).count();
        assert_eq!(non_duplicate, 200, "workers={workers}");
        let runtime_dups = outcomes
            .iter()
            .filter(|o| **o == Outcome::Duplicate(DuplicateKind::Runtime))
            .count();
        assert_eq!(runtime_dups, 800, "workers={workers}");
        // Losers of the claim never reach DNS.
        assert_eq!(dns.lookups.load(Ordering::SeqCst), 200, "workers={workers}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_persists_once_and_second_run_is_all_historical() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state").join("master_threat_db.csv");
    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(FixedCollector {
            label: "Hacker News",
            candidates: repeated_candidates(),
        }),
        Box::new(FixedCollector {
            label: "GitHub",
            candidates: vec![
                Candidate::new("GitHub", "https://dead.invalid"),
                Candidate::new("GitHub", "https://registry.npmjs.com/pkg"),
                Candidate::new("GitHub", "https://github.com/some/repo"),
            ],
        }),
    ];
    let allowlist = Allowlist::parse("# vendors\nnpmjs.com\n");

    {
        let store = Arc::new(RwLock::new(RecordStore::open(&db_path).unwrap()));
        let p = pipeline(Arc::new(FakeDns::default()), allowlist.clone(), 20);
        let stats = p.run(&collectors, Arc::clone(&store)).await.unwrap();
        assert_eq!(stats.raw_items, 1003);
        assert_eq!(stats.filtered_items, 200);
        assert_eq!(stats.written_to_db, 200);
        assert_eq!(stats.duplicate_runtime, 800);
        assert_eq!(stats.enrichment_failed, 1);
        assert_eq!(stats.allowed, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.by_provider.get("Cloudflare"), Some(&200));
        assert_eq!(stats.by_source.get("Hacker News"), Some(&200));
    }

    let text = std::fs::read_to_string(&db_path).unwrap();
    assert_eq!(text.lines().count(), 201);
    assert_eq!(text.matches("Timestamp_Found").count(), 1);

    // Fresh store handle, as a new process would see it.
    let store = Arc::new(RwLock::new(RecordStore::open(&db_path).unwrap()));
    assert_eq!(store.read().await.len(), 200);
    let dns = Arc::new(FakeDns::default());
    let p = pipeline(Arc::clone(&dns), allowlist, 4);
    let stats = p.run(&collectors, Arc::clone(&store)).await.unwrap();
    assert_eq!(stats.written_to_db, 0);
    assert_eq!(stats.duplicate_historical, 1000);
    // Only the dead host gets as far as DNS.
    assert_eq!(dns.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read_to_string(&db_path).unwrap().lines().count(), 201);
}

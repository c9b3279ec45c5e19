//! Run statistics artifact (`ingest_stats.json`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::outcome::{DuplicateKind, Outcome};

/// Counters for one ingest run. `raw_items`, `filtered_items` and
/// `written_to_db` are the keys downstream reporting reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Candidates returned by all collectors.
    pub raw_items: usize,
    /// Candidates that passed every filter and were enriched.
    pub filtered_items: usize,
    /// Records actually appended to the store.
    pub written_to_db: usize,
    pub rejected: usize,
    pub duplicate_historical: usize,
    pub duplicate_runtime: usize,
    pub allowed: usize,
    pub enrichment_failed: usize,
    pub collector_failures: usize,
    /// Enriched records per source label.
    #[serde(default)]
    pub by_source: BTreeMap<String, usize>,
    /// Enriched records per hosting provider.
    #[serde(default)]
    pub by_provider: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Record(r) => {
                self.filtered_items += 1;
                *self.by_source.entry(r.source.clone()).or_default() += 1;
                *self.by_provider.entry(r.hosting_provider.clone()).or_default() += 1;
            }
            Outcome::Filtered(_) => self.rejected += 1,
            Outcome::Duplicate(DuplicateKind::Historical) => self.duplicate_historical += 1,
            Outcome::Duplicate(DuplicateKind::Runtime) => self.duplicate_runtime += 1,
            Outcome::Allowed => self.allowed += 1,
            Outcome::Failed(_) => self.enrichment_failed += 1,
        }
    }

    /// Outcomes tallied so far.
    pub fn accounted(&self) -> usize {
        self.filtered_items
            + self.rejected
            + self.duplicate_historical
            + self.duplicate_runtime
            + self.allowed
            + self.enrichment_failed
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize run stats")?;
        std::fs::write(path, json)
            .with_context(|| format!("write run stats: {}", path.display()))?;
        Ok(())
    }
}

//! The per-candidate sequence run by each pool worker.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::claims::RuntimeClaims;
use super::outcome::{DuplicateKind, FilterStage, Outcome};
use crate::collect::Candidate;
use crate::enrich::Enricher;
use crate::redirect::RedirectResolver;
use crate::store::{RecordStore, ThreatRecord};
use crate::url_model::{normalize, Allowlist, CanonicalUrl};

/// Everything a worker reads; shared by the whole pool for one run.
pub(crate) struct WorkerContext {
    pub allowlist: Arc<Allowlist>,
    pub resolver: Arc<RedirectResolver>,
    pub enricher: Arc<Enricher>,
    pub claims: RuntimeClaims,
    pub store: Arc<RwLock<RecordStore>>,
}

impl WorkerContext {
    /// Historical dedup, runtime claim, allowlist; `None` means keep going.
    async fn gate(&self, key: &CanonicalUrl) -> Option<Outcome> {
        if self.store.read().await.exists(key) {
            return Some(Outcome::Duplicate(DuplicateKind::Historical));
        }
        if !self.claims.claim(key) {
            return Some(Outcome::Duplicate(DuplicateKind::Runtime));
        }
        if self.allowlist.is_allowed(key.as_str()) {
            tracing::debug!(url = %key, "allowlisted");
            return Some(Outcome::Allowed);
        }
        None
    }
}

pub(crate) async fn process_candidate(ctx: &WorkerContext, candidate: Candidate) -> Outcome {
    let Some(key) = normalize(&candidate.raw_url) else {
        return Outcome::Filtered(FilterStage::Discovered);
    };
    if let Some(done) = ctx.gate(&key).await {
        return done;
    }

    let resolved = ctx.resolver.resolve(&key, &candidate.raw_url).await;
    let mut clean_url = key;
    if resolved != clean_url.as_str() {
        let Some(final_key) = normalize(&resolved) else {
            tracing::debug!(url = %clean_url, %resolved, "redirect target filtered");
            return Outcome::Filtered(FilterStage::Redirected);
        };
        if final_key != clean_url {
            if let Some(done) = ctx.gate(&final_key).await {
                return done;
            }
            tracing::debug!(from = %clean_url, to = %final_key, "shortener resolved");
            clean_url = final_key;
        }
    }

    match ctx.enricher.enrich(&clean_url, &candidate.source).await {
        Ok(enriched) => Outcome::Record(ThreatRecord {
            timestamp_found: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source: candidate.source,
            clean_url,
            risk_score: enriched.risk_score,
            ip_address: enriched.ip.to_string(),
            hosting_provider: enriched.provider.to_string(),
            original_raw_link: candidate.raw_url,
        }),
        Err(e) => {
            tracing::warn!(url = %clean_url, source = %candidate.source, "enrichment failed: {}", e);
            Outcome::Failed(e)
        }
    }
}

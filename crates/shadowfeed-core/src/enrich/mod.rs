//! Enrichment: hosting metadata plus a risk score for one canonical URL.
//!
//! Forward DNS failure fails the whole enrichment and the candidate is
//! dropped. Nothing here retries.

mod hosting;
mod score;

pub use hosting::{
    detect_provider, provider_for_prefix, provider_for_rdns, DnsHostLookup, HostLookup,
    HostingProvider,
};
pub use score::{risk_score, tier, RiskTier};

use std::net::IpAddr;
use std::sync::Arc;

use crate::collect::SourceKind;
use crate::config::ScoringConfig;
use crate::url_model::CanonicalUrl;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichError {
    #[error("DNS lookup failed for {host}: {reason}")]
    Lookup { host: String, reason: String },
    #[error("no address records for {host}")]
    NoAddress { host: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub ip: IpAddr,
    pub provider: HostingProvider,
    pub risk_score: u32,
    pub tier: RiskTier,
}

pub struct Enricher {
    lookup: Arc<dyn HostLookup>,
    scoring: ScoringConfig,
}

impl Enricher {
    pub fn new(lookup: Arc<dyn HostLookup>, scoring: ScoringConfig) -> Self {
        Self { lookup, scoring }
    }

    pub async fn enrich(
        &self,
        clean_url: &CanonicalUrl,
        source: &str,
    ) -> Result<EnrichmentResult, EnrichError> {
        let ip = self.lookup.lookup_ip(clean_url.host()).await?;
        let provider = detect_provider(ip, self.lookup.as_ref()).await;
        let risk_score = score::risk_score(
            &self.scoring,
            clean_url.as_str(),
            SourceKind::from_label(source),
            &provider,
        );
        let tier = score::tier(&self.scoring, risk_score);
        tracing::debug!(url = %clean_url, %ip, %provider, risk_score, "enriched");
        Ok(EnrichmentResult {
            ip,
            provider,
            risk_score,
            tier,
        })
    }
}

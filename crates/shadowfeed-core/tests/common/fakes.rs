//! In-memory collaborators for pipeline integration tests.

use async_trait::async_trait;
use shadowfeed_core::collect::{Candidate, CollectionError, Collector, SourceKind};
use shadowfeed_core::enrich::{EnrichError, HostLookup};
use shadowfeed_core::redirect::{ProbeError, ProbeStep, RedirectFollower};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolves every host to the same address; reverse DNS says Cloudflare.
#[derive(Default)]
pub struct FakeDns {
    pub lookups: AtomicUsize,
}

#[async_trait]
impl HostLookup for FakeDns {
    async fn lookup_ip(&self, host: &str) -> Result<IpAddr, EnrichError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if host.ends_with(".invalid") {
            return Err(EnrichError::NoAddress {
                host: host.to_string(),
            });
        }
        // Yield so workers interleave.
        tokio::task::yield_now().await;
        Ok("198.51.100.20".parse().unwrap())
    }

    async fn reverse_lookup(&self, _ip: IpAddr) -> Option<String> {
        Some("edge-1.cloudflare.example".to_string())
    }
}

/// Never reached for non-shortener inputs; fails if it is.
pub struct NoNetwork;

impl RedirectFollower for NoNetwork {
    fn follow(&self, url: &str, _step: &ProbeStep) -> Result<String, ProbeError> {
        Err(ProbeError::Join(format!("unexpected probe of {}", url)))
    }
}

pub struct FixedCollector {
    pub label: &'static str,
    pub candidates: Vec<Candidate>,
}

#[async_trait]
impl Collector for FixedCollector {
    fn name(&self) -> &str {
        self.label
    }

    fn kind(&self) -> SourceKind {
        SourceKind::from_label(self.label)
    }

    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError> {
        Ok(self.candidates.clone())
    }
}

//! Hosting resolution: host → IP → provider.

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use super::EnrichError;

/// Hosting provider classification for a resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostingProvider {
    Cloudflare,
    Aws,
    Gcp,
    Azure,
    DigitalOcean,
    Vercel,
    Heroku,
    Fastly,
    Akamai,
    /// Reverse DNS answered with a name no fragment matched; kept verbatim.
    Other(String),
    /// Neither the prefix table nor reverse DNS produced anything.
    Unknown,
}

impl HostingProvider {
    /// Providers whose edge hides the origin server.
    pub fn is_cdn(&self) -> bool {
        matches!(
            self,
            HostingProvider::Cloudflare | HostingProvider::Fastly | HostingProvider::Akamai
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HostingProvider::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            HostingProvider::Cloudflare => "Cloudflare",
            HostingProvider::Aws => "AWS",
            HostingProvider::Gcp => "GCP",
            HostingProvider::Azure => "Azure",
            HostingProvider::DigitalOcean => "DigitalOcean",
            HostingProvider::Vercel => "Vercel",
            HostingProvider::Heroku => "Heroku",
            HostingProvider::Fastly => "Fastly",
            HostingProvider::Akamai => "Akamai",
            HostingProvider::Other(name) => name,
            HostingProvider::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HostingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Textual IP prefixes of well-known cloud/CDN ranges (fast path, no network).
const PREFIX_TABLE: &[(&str, HostingProvider)] = &[
    ("2606:4700", HostingProvider::Cloudflare),
    ("172.64", HostingProvider::Cloudflare),
    ("104.", HostingProvider::Cloudflare),
    ("13.", HostingProvider::Aws),
    ("52.", HostingProvider::Aws),
    ("54.", HostingProvider::Aws),
    ("3.", HostingProvider::Aws),
    ("18.", HostingProvider::Aws),
    ("34.", HostingProvider::Gcp),
    ("35.", HostingProvider::Gcp),
    ("216.24.", HostingProvider::Vercel),
    ("76.76.21.", HostingProvider::Vercel),
];

/// Substrings of reverse-DNS names, checked in order.
const RDNS_FRAGMENTS: &[(&str, HostingProvider)] = &[
    ("amazonaws", HostingProvider::Aws),
    ("google", HostingProvider::Gcp),
    ("azure", HostingProvider::Azure),
    ("microsoft", HostingProvider::Azure),
    ("cloudflare", HostingProvider::Cloudflare),
    ("digitalocean", HostingProvider::DigitalOcean),
    ("vercel", HostingProvider::Vercel),
    ("herokuapp", HostingProvider::Heroku),
    ("fastly", HostingProvider::Fastly),
    ("akamai", HostingProvider::Akamai),
];

pub fn provider_for_prefix(ip: &IpAddr) -> Option<HostingProvider> {
    let text = ip.to_string();
    PREFIX_TABLE
        .iter()
        .find(|(prefix, _)| text.starts_with(prefix))
        .map(|(_, provider)| provider.clone())
}

pub fn provider_for_rdns(name: &str) -> Option<HostingProvider> {
    let name = name.to_lowercase();
    RDNS_FRAGMENTS
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map(|(_, provider)| provider.clone())
}

/// Forward and reverse DNS used by enrichment.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// First address for `host`. Failure drops the candidate.
    async fn lookup_ip(&self, host: &str) -> Result<IpAddr, EnrichError>;

    /// First PTR name for `ip`, or None when reverse DNS fails or is empty.
    async fn reverse_lookup(&self, ip: IpAddr) -> Option<String>;
}

/// Classifies `ip`: prefix table, then reverse-DNS fragments, then the raw PTR name, else Unknown.
pub async fn detect_provider(ip: IpAddr, lookup: &dyn HostLookup) -> HostingProvider {
    if let Some(provider) = provider_for_prefix(&ip) {
        return provider;
    }
    match lookup.reverse_lookup(ip).await {
        Some(name) => provider_for_rdns(&name).unwrap_or(HostingProvider::Other(name)),
        None => HostingProvider::Unknown,
    }
}

/// Production lookup over trust-dns; timeouts are the resolver's defaults.
pub struct DnsHostLookup {
    resolver: TokioAsyncResolver,
}

impl DnsHostLookup {
    /// Uses the system resolver config, falling back to the library defaults.
    pub fn from_system_conf() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!("system resolver config unavailable ({}); using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

#[async_trait]
impl HostLookup for DnsHostLookup {
    async fn lookup_ip(&self, host: &str) -> Result<IpAddr, EnrichError> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| EnrichError::Lookup {
                host: host.to_string(),
                reason: e.to_string(),
            })?;
        response.iter().next().ok_or_else(|| EnrichError::NoAddress {
            host: host.to_string(),
        })
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Option<String> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(names) => names
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())
                .filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::debug!(%ip, "reverse DNS failed: {}", e);
                None
            }
        }
    }
}

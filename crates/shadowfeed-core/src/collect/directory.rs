//! Product-directory listing page (static HTML fetch).

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;

use super::transport::{fetch, HttpTransport};
use super::{Candidate, CollectionError, Collector, RequestTally, SourceKind};
use crate::config::SourcesConfig;

/// Directory sites serve bot user agents a stripped page.
const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

pub struct DirectoryCollector {
    transport: Arc<dyn HttpTransport>,
    listing_url: String,
}

impl DirectoryCollector {
    pub fn new(transport: Arc<dyn HttpTransport>, sources: &SourcesConfig) -> Self {
        Self {
            transport,
            listing_url: sources.directory_url.clone(),
        }
    }

    fn directory_host(&self) -> Result<String, CollectionError> {
        let parsed = url::Url::parse(&self.listing_url).map_err(|e| CollectionError::Config {
            collector: self.name().to_string(),
            reason: format!("directory URL {}: {}", self.listing_url, e),
        })?;
        let host = parsed.host_str().unwrap_or_default();
        Ok(host.strip_prefix("www.").unwrap_or(host).to_string())
    }
}

#[async_trait]
impl Collector for DirectoryCollector {
    fn name(&self) -> &str {
        "Directory Scraper"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError> {
        let own_host = self.directory_host()?;
        let mut tally = RequestTally::default();
        let mut candidates = Vec::new();
        match fetch(&self.transport, &self.listing_url, &[("User-Agent", BROWSER_UA)]).await {
            Ok(resp) => {
                tally.succeeded();
                candidates = outbound_links(&resp.text(), &own_host)
                    .into_iter()
                    .map(|link| Candidate::new(self.name(), link))
                    .collect();
            }
            Err(e) => tally.failed(self.name(), &self.listing_url, e),
        }
        tally.finish(self.name(), candidates)
    }
}

/// Absolute `http(s)` anchors whose host is not the directory itself (or a subdomain of it).
fn outbound_links(html: &str, own_host: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href^='http']") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !is_internal(href, own_host))
        .map(str::to_string)
        .collect()
}

fn is_internal(link: &str, own_host: &str) -> bool {
    let Some(host) = url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        // Unparsable absolute links are noise.
        return true;
    };
    host == own_host
        || host
            .strip_suffix(own_host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

//! Hacker News "Show HN" backfill via the Algolia search API.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::transport::{fetch, HttpTransport};
use super::{pause, Candidate, CollectionError, Collector, RequestTally, SourceKind};
use crate::config::SourcesConfig;

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search_by_date";
const HITS_PER_PAGE: &str = "50";

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    url: Option<String>,
    created_at_i: i64,
}

/// Walks `show_hn` posts backwards in time until the lookback window is covered.
pub struct HackerNewsCollector {
    transport: Arc<dyn HttpTransport>,
    query: String,
    lookback_days: i64,
    max_pages: u32,
    delay: Duration,
}

impl HackerNewsCollector {
    pub fn new(transport: Arc<dyn HttpTransport>, sources: &SourcesConfig) -> Self {
        Self {
            transport,
            query: sources.hn_query.clone(),
            lookback_days: sources.hn_lookback_days,
            max_pages: sources.hn_max_pages.max(1),
            delay: sources.request_delay(),
        }
    }

    fn page_url(&self, before: i64) -> Result<String, CollectionError> {
        let filter = format!("created_at_i<{}", before);
        url::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("query", self.query.as_str()),
                ("tags", "show_hn"),
                ("numericFilters", filter.as_str()),
                ("hitsPerPage", HITS_PER_PAGE),
            ],
        )
        .map(String::from)
        .map_err(|e| CollectionError::Config {
            collector: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    /// Backfill from `now` (unix seconds) back to `now - lookback_days`.
    async fn backfill(&self, now: i64) -> Result<Vec<Candidate>, CollectionError> {
        let since = now.saturating_sub(self.lookback_days.saturating_mul(86_400));
        let mut cursor = now;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut tally = RequestTally::default();

        for page in 0..self.max_pages {
            if cursor <= since {
                break;
            }
            let url = self.page_url(cursor)?;
            let parsed = match fetch(&self.transport, &url, &[]).await {
                Ok(resp) => serde_json::from_slice::<SearchPage>(&resp.body)
                    .map_err(|e| format!("decode search page: {}", e)),
                Err(e) => Err(e.to_string()),
            };
            pause(self.delay).await;

            let hits = match parsed {
                Ok(p) => {
                    tally.succeeded();
                    p.hits
                }
                Err(e) => {
                    // No retry: the window is left short rather than spinning on a dead API.
                    tally.failed(self.name(), &url, e);
                    break;
                }
            };
            if hits.is_empty() {
                break;
            }

            let oldest = hits.iter().map(|h| h.created_at_i).min().unwrap_or(cursor);
            for hit in hits {
                if let Some(domain) = hit.url.as_deref().and_then(hit_domain) {
                    if seen.insert(domain.clone()) {
                        candidates.push(Candidate::new(self.name(), domain));
                    }
                }
            }

            if oldest >= cursor {
                tracing::debug!("HN backfill: no older items, stopping");
                break;
            }
            cursor = oldest;
            tracing::debug!(page, cursor, found = candidates.len(), "HN backfill progress");
        }
        tally.finish(self.name(), candidates)
    }
}

/// Host of a posted link without `www.`; GitHub links are skipped.
fn hit_domain(link: &str) -> Option<String> {
    if link.is_empty() || link.contains("github.com") {
        return None;
    }
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_string())
}

#[async_trait]
impl Collector for HackerNewsCollector {
    fn name(&self) -> &str {
        "Hacker News"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::HackerNews
    }

    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError> {
        self.backfill(Utc::now().timestamp()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::testing::FakeTransport;

    const NOW: i64 = 1_790_000_000;
    const DAY: i64 = 86_400;

    fn sources(days: i64, max_pages: u32) -> SourcesConfig {
        SourcesConfig {
            hn_lookback_days: days,
            hn_max_pages: max_pages,
            request_delay_ms: 0,
            ..SourcesConfig::default()
        }
    }

    fn page(hits: &[(&str, i64)]) -> String {
        let hits: Vec<_> = hits
            .iter()
            .map(|(u, t)| serde_json::json!({"url": u, "created_at_i": t}))
            .collect();
        serde_json::json!({ "hits": hits }).to_string()
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(hit_domain("https://www.tool.dev/launch?x=1"), Some("tool.dev".into()));
        assert_eq!(hit_domain("https://github.com/a/b"), None);
        assert_eq!(hit_domain("not a url"), None);
        assert_eq!(hit_domain(""), None);
    }

    #[tokio::test]
    async fn walks_back_until_window_covered() {
        let first = page(&[
            ("https://a.io/x", NOW - DAY),
            ("https://github.com/z/z", NOW - 2 * DAY),
            ("https://www.a.io/y", NOW - 3 * DAY),
        ]);
        let second = page(&[("https://b.io", NOW - 10 * DAY), ("", NOW - 12 * DAY)]);
        let fake = Arc::new(
            FakeTransport::new()
                .route(&format!("created_at_i%3C{}", NOW), 200, &first)
                .route(&format!("created_at_i%3C{}", NOW - 3 * DAY), 200, &second),
        );
        let collector = HackerNewsCollector::new(fake.clone(), &sources(11, 200));
        let got = collector.backfill(NOW).await.unwrap();
        let domains: Vec<_> = got.iter().map(|c| c.raw_url.as_str()).collect();
        assert_eq!(domains, vec!["a.io", "b.io"]);
        assert!(got.iter().all(|c| c.source == "Hacker News"));
        // Cursor reached NOW - 12 days, past the 11-day window: two requests only.
        assert_eq!(fake.urls().len(), 2);
        assert!(fake.urls()[0].contains("tags=show_hn"));
    }

    #[tokio::test]
    async fn stops_when_time_does_not_move() {
        let same = page(&[("https://a.io", NOW)]);
        let fake = Arc::new(FakeTransport::new().route("search_by_date", 200, &same));
        let collector = HackerNewsCollector::new(fake.clone(), &sources(90, 200));
        assert_eq!(collector.backfill(NOW).await.unwrap().len(), 1);
        assert_eq!(fake.urls().len(), 1);
    }

    #[tokio::test]
    async fn stops_on_empty_page_and_respects_page_cap() {
        let fake = Arc::new(FakeTransport::new().route("search_by_date", 200, r#"{"hits":[]}"#));
        let collector = HackerNewsCollector::new(fake.clone(), &sources(90, 200));
        assert!(collector.backfill(NOW).await.unwrap().is_empty());
        assert_eq!(fake.urls().len(), 1);

        let mut fake = FakeTransport::new();
        for i in 0..5 {
            let body = page(&[(&format!("https://t{}.io", i), NOW - (i + 1) * DAY)]);
            fake = fake.route(&format!("created_at_i%3C{}", NOW - i * DAY), 200, &body);
        }
        let fake = Arc::new(fake);
        let collector = HackerNewsCollector::new(fake.clone(), &sources(90, 3));
        assert_eq!(collector.backfill(NOW).await.unwrap().len(), 3);
        assert_eq!(fake.urls().len(), 3);
    }

    #[tokio::test]
    async fn huge_lookback_saturates_instead_of_overflowing() {
        let fake = Arc::new(FakeTransport::new().route("search_by_date", 200, r#"{"hits":[]}"#));
        let collector = HackerNewsCollector::new(fake.clone(), &sources(i64::MAX, 2));
        assert!(collector.backfill(NOW).await.unwrap().is_empty());
        assert_eq!(fake.urls().len(), 1);
    }

    #[tokio::test]
    async fn failure_on_first_page_is_unavailable() {
        let fake = Arc::new(FakeTransport::new().route("search_by_date", 503, ""));
        let collector = HackerNewsCollector::new(fake, &sources(90, 200));
        assert!(collector.backfill(NOW).await.is_err());
    }
}

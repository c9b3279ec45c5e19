//! GitHub repository search by topic.

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::transport::{fetch, HttpTransport};
use super::{pause, Candidate, CollectionError, Collector, RequestTally, SourceKind};
use crate::config::SourcesConfig;

const SEARCH_URL: &str = "https://api.github.com/search/repositories";
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    homepage: Option<String>,
    html_url: Option<String>,
}

impl Repo {
    /// The project homepage when set, else the repository page.
    fn target(self) -> Option<String> {
        self.homepage
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .or(self.html_url)
    }
}

/// Recently created repositories tagged with AI-tool topics.
pub struct GitHubCollector {
    transport: Arc<dyn HttpTransport>,
    topics: Vec<String>,
    lookback_months: u32,
    max_pages: u32,
    delay: Duration,
    token: Option<String>,
}

impl GitHubCollector {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        sources: &SourcesConfig,
        token: Option<String>,
    ) -> Self {
        Self {
            transport,
            topics: sources.github_topics.clone(),
            lookback_months: sources.github_lookback_months,
            max_pages: sources.github_max_pages.max(1),
            delay: sources.request_delay(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn created_since(&self) -> NaiveDate {
        let today = Utc::now().date_naive();
        today
            .checked_sub_months(Months::new(self.lookback_months))
            .unwrap_or(today)
    }

    fn page_url(&self, topic: &str, since: NaiveDate, page: u32) -> Result<String, CollectionError> {
        let query = format!("topic:{} created:>{}", topic, since.format("%Y-%m-%d"));
        let page = page.to_string();
        let per_page = PER_PAGE.to_string();
        url::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("q", query.as_str()),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| CollectionError::Config {
            collector: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Collector for GitHubCollector {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::GitHub
    }

    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError> {
        let since = self.created_since();
        let auth = self.token.as_ref().map(|t| format!("Bearer {}", t));
        let mut headers = vec![
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", "2022-11-28"),
        ];
        if let Some(auth) = auth.as_deref() {
            headers.push(("Authorization", auth));
        }

        let mut tally = RequestTally::default();
        let mut candidates = Vec::new();
        for topic in &self.topics {
            for page in 1..=self.max_pages {
                let url = self.page_url(topic, since, page)?;
                tracing::debug!(topic = %topic, page, "searching GitHub");
                let parsed = match fetch(&self.transport, &url, &headers).await {
                    Ok(resp) => serde_json::from_slice::<SearchPage>(&resp.body)
                        .map_err(|e| format!("decode search page: {}", e)),
                    Err(e) => Err(e.to_string()),
                };
                pause(self.delay).await;

                let items = match parsed {
                    Ok(p) => {
                        tally.succeeded();
                        p.items
                    }
                    Err(e) => {
                        // Rate limits land here too; the topic is abandoned, not retried.
                        tally.failed(self.name(), &url, e);
                        break;
                    }
                };
                let full_page = items.len() == PER_PAGE;
                candidates.extend(
                    items
                        .into_iter()
                        .filter_map(Repo::target)
                        .map(|u| Candidate::new(self.name(), u)),
                );
                if !full_page {
                    break;
                }
            }
        }
        tally.finish(self.name(), candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::testing::FakeTransport;

    fn sources(topics: &[&str], max_pages: u32) -> SourcesConfig {
        SourcesConfig {
            github_topics: topics.iter().map(|t| t.to_string()).collect(),
            github_max_pages: max_pages,
            request_delay_ms: 0,
            ..SourcesConfig::default()
        }
    }

    #[tokio::test]
    async fn prefers_homepage_over_repo_page() {
        let body = r#"{"total_count":3,"items":[
            {"homepage":"https://myagent.ai","html_url":"https://github.com/a/agent"},
            {"homepage":"","html_url":"https://github.com/b/tool"},
            {"homepage":null,"html_url":null}
        ]}"#;
        let fake = Arc::new(FakeTransport::new().route("topic%3Aai-agent", 200, body));
        let collector = GitHubCollector::new(fake.clone(), &sources(&["ai-agent"], 10), None);
        let got = collector.collect().await.unwrap();
        let urls: Vec<_> = got.iter().map(|c| c.raw_url.as_str()).collect();
        assert_eq!(urls, vec!["https://myagent.ai", "https://github.com/b/tool"]);
        assert!(got.iter().all(|c| c.source == "GitHub"));
        // Short page: no second request.
        assert_eq!(fake.urls().len(), 1);
    }

    #[tokio::test]
    async fn query_carries_topic_window_and_sort() {
        let fake = Arc::new(FakeTransport::new().route("api.github.com", 200, r#"{"items":[]}"#));
        let collector = GitHubCollector::new(fake.clone(), &sources(&["llm-tool"], 1), Some("tok".into()));
        collector.collect().await.unwrap();

        let requests = fake.requests.lock().unwrap().clone();
        let (url, headers) = &requests[0];
        assert!(url.contains("topic%3Allm-tool"));
        assert!(url.contains("created%3A%3E"));
        assert!(url.contains("sort=updated"));
        assert!(url.contains("per_page=100"));
        assert!(headers.contains(&("Authorization".to_string(), "Bearer tok".to_string())));
    }

    #[tokio::test]
    async fn full_pages_paginate_up_to_cap() {
        let item = r#"{"homepage":"https://x.io","html_url":"https://github.com/x/x"}"#;
        let body = format!(r#"{{"items":[{}]}}"#, vec![item; PER_PAGE].join(","));
        let fake = Arc::new(FakeTransport::new().route("api.github.com", 200, &body));
        let collector = GitHubCollector::new(fake.clone(), &sources(&["ai-agent"], 3), None);
        let got = collector.collect().await.unwrap();
        assert_eq!(got.len(), 3 * PER_PAGE);
        assert_eq!(fake.urls().len(), 3);
    }

    #[tokio::test]
    async fn one_failing_topic_is_partial_not_fatal() {
        let fake = Arc::new(
            FakeTransport::new()
                .route("topic%3Aai-agent", 200, r#"{"items":[{"homepage":"https://a.io"}]}"#)
                .route("topic%3Agpt-wrapper", 403, "rate limited"),
        );
        let collector =
            GitHubCollector::new(fake, &sources(&["ai-agent", "gpt-wrapper"], 10), None);
        assert_eq!(collector.collect().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_topics_failing_is_unavailable() {
        let fake = Arc::new(FakeTransport::new().route("api.github.com", 403, ""));
        let collector = GitHubCollector::new(fake, &sources(&["ai-agent", "llm-tool"], 10), None);
        assert!(matches!(
            collector.collect().await,
            Err(CollectionError::Unavailable { attempts: 2, .. })
        ));
    }
}

//! Candidate collectors: pluggable producers of raw URLs.
//!
//! Each collector talks HTTP through [`HttpTransport`] and returns whatever it
//! managed to gather. Individual request failures are logged and skipped; a
//! collector fails with [`CollectionError::Unavailable`] only when every
//! request it attempted failed.

mod directory;
mod github;
mod hackernews;
mod reddit;
mod transport;

pub use directory::DirectoryCollector;
pub use github::GitHubCollector;
pub use hackernews::HackerNewsCollector;
pub use reddit::RedditCollector;
pub use transport::{fetch, CurlTransport, HttpResponse, HttpTransport, TransportError};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SourcesConfig;

/// A raw URL and the feed it came from. Lives only for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,
    pub raw_url: String,
}

impl Candidate {
    pub fn new(source: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            raw_url: raw_url.into(),
        }
    }
}

/// Feed category, used to weight the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    GitHub,
    Reddit,
    HackerNews,
    Directory,
    Other,
}

impl SourceKind {
    /// Maps a candidate's source label (e.g. `Reddit (r/SaaS)`) to its category.
    pub fn from_label(label: &str) -> Self {
        if label.contains("Reddit") {
            SourceKind::Reddit
        } else if label.contains("Hacker News") {
            SourceKind::HackerNews
        } else if label.contains("GitHub") {
            SourceKind::GitHub
        } else if label.contains("Directory") {
            SourceKind::Directory
        } else {
            SourceKind::Other
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("{collector}: all {attempts} request(s) failed; last error: {last_error}")]
    Unavailable {
        collector: String,
        attempts: usize,
        last_error: String,
    },
    #[error("{collector}: {reason}")]
    Config { collector: String, reason: String },
}

#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;
    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError>;
}

/// Request outcomes of one collector run.
#[derive(Debug, Default)]
pub(crate) struct RequestTally {
    attempted: usize,
    failed: usize,
    last_error: Option<String>,
}

impl RequestTally {
    pub(crate) fn succeeded(&mut self) {
        self.attempted += 1;
    }

    pub(crate) fn failed(&mut self, collector: &str, url: &str, err: impl fmt::Display) {
        self.attempted += 1;
        self.failed += 1;
        tracing::warn!(collector, url, "request failed: {}", err);
        self.last_error = Some(err.to_string());
    }

    pub(crate) fn finish(
        self,
        collector: &str,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, CollectionError> {
        if self.attempted > 0 && self.failed == self.attempted {
            return Err(CollectionError::Unavailable {
                collector: collector.to_string(),
                attempts: self.attempted,
                last_error: self.last_error.unwrap_or_default(),
            });
        }
        tracing::info!(collector, found = candidates.len(), failed_requests = self.failed, "collector finished");
        Ok(candidates)
    }
}

/// Pause between requests to the same feed.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Builds the collectors for `kinds` (all four when empty), in fixed order.
pub fn from_config(
    sources: &SourcesConfig,
    kinds: &[SourceKind],
    transport: Arc<dyn HttpTransport>,
    github_token: Option<String>,
) -> Vec<Box<dyn Collector>> {
    let wanted = |k: SourceKind| kinds.is_empty() || kinds.contains(&k);
    let mut out: Vec<Box<dyn Collector>> = Vec::new();
    if wanted(SourceKind::GitHub) {
        out.push(Box::new(GitHubCollector::new(
            Arc::clone(&transport),
            sources,
            github_token,
        )));
    }
    if wanted(SourceKind::Reddit) {
        out.push(Box::new(RedditCollector::new(Arc::clone(&transport), sources)));
    }
    if wanted(SourceKind::HackerNews) {
        out.push(Box::new(HackerNewsCollector::new(Arc::clone(&transport), sources)));
    }
    if wanted(SourceKind::Directory) {
        out.push(Box::new(DirectoryCollector::new(transport, sources)));
    }
    out
}

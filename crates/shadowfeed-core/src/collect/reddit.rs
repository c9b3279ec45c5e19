//! Reddit subreddit search feeds (Atom).

use async_trait::async_trait;
use quick_xml::events::Event;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use super::transport::{fetch, HttpTransport};
use super::{pause, Candidate, CollectionError, Collector, RequestTally, SourceKind};
use crate::config::SourcesConfig;

/// Link hosts that point back into Reddit itself.
const SELF_LINKS: &[&str] = &["reddit.com", "redd.it"];

pub struct RedditCollector {
    transport: Arc<dyn HttpTransport>,
    subreddits: Vec<String>,
    delay: Duration,
}

impl RedditCollector {
    pub fn new(transport: Arc<dyn HttpTransport>, sources: &SourcesConfig) -> Self {
        Self {
            transport,
            subreddits: sources.subreddits.clone(),
            delay: sources.request_delay(),
        }
    }

    fn feed_url(sub: &str) -> String {
        format!(
            "https://www.reddit.com/r/{}/search.rss?q=AI&sort=new&restrict_sr=on",
            sub
        )
    }
}

#[async_trait]
impl Collector for RedditCollector {
    fn name(&self) -> &str {
        "Reddit"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }

    async fn collect(&self) -> Result<Vec<Candidate>, CollectionError> {
        let mut tally = RequestTally::default();
        let mut candidates = Vec::new();
        for sub in &self.subreddits {
            let url = Self::feed_url(sub);
            let entries = match fetch(&self.transport, &url, &[]).await {
                Ok(resp) => entry_contents(&resp.body).map_err(|e| format!("parse feed: {}", e)),
                Err(e) => Err(e.to_string()),
            };
            pause(self.delay).await;

            let entries = match entries {
                Ok(entries) => {
                    tally.succeeded();
                    entries
                }
                Err(e) => {
                    tally.failed(self.name(), &url, e);
                    continue;
                }
            };
            tracing::debug!(subreddit = %sub, entries = entries.len(), "read Reddit feed");
            let label = format!("Reddit (r/{})", sub);
            candidates.extend(
                entries
                    .iter()
                    .filter_map(|html| first_external_link(html))
                    .map(|link| Candidate::new(label.clone(), link)),
            );
        }
        tally.finish(self.name(), candidates)
    }
}

/// HTML bodies of every `<entry><content>` in an Atom document.
fn entry_contents(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut in_entry = false;
    let mut content: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => in_entry = true,
                b"content" if in_entry => content = Some(String::new()),
                _ => {}
            },
            Event::Text(te) => {
                if let Some(c) = content.as_mut() {
                    c.push_str(&te.unescape()?);
                }
            }
            Event::CData(cd) => {
                if let Some(c) = content.as_mut() {
                    c.push_str(&String::from_utf8_lossy(&cd.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"content" => out.extend(content.take()),
                b"entry" => in_entry = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// First absolute link in a post body that leaves Reddit.
fn first_external_link(html: &str) -> Option<String> {
    let selector = Selector::parse("a[href]").ok()?;
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| href.starts_with("http") && !SELF_LINKS.iter().any(|s| href.contains(s)))
        .map(str::to_string)
}

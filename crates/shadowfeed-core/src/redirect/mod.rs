//! Short-link resolution.
//!
//! Only canonical URLs whose host is a known shortener are probed; everything
//! else returns immediately without touching the network. Probing walks the
//! fallback chain (HEAD, then GET) and returns the first effective URL. On total
//! failure the input comes back unchanged. The result is NOT normalized: the
//! caller re-runs the normalizer on it.

mod chain;
mod follow;

pub use chain::{default_chain, ProbeMethod, ProbeStep};
pub use follow::{CurlFollower, ProbeError, RedirectFollower};

use std::sync::Arc;
use std::time::Duration;

use crate::url_model::{host_of, CanonicalUrl};

/// Link-shortener hosts (exact host or subdomain).
pub const SHORTENER_HOSTS: &[&str] = &["bit.ly", "t.co", "goo.gl", "tinyurl.com"];

/// True when the host of `url` (canonical key or raw link) is a link shortener.
pub fn is_shortener(url: &str) -> bool {
    let lowered = url.to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = host_of(without_scheme);
    SHORTENER_HOSTS.iter().any(|short| {
        host == *short
            || host
                .strip_suffix(short)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

pub struct RedirectResolver {
    follower: Arc<dyn RedirectFollower>,
    chain: Vec<ProbeStep>,
}

impl RedirectResolver {
    pub fn new(follower: Arc<dyn RedirectFollower>, timeout: Duration) -> Self {
        Self::with_chain(follower, default_chain(timeout))
    }

    pub fn with_chain(follower: Arc<dyn RedirectFollower>, chain: Vec<ProbeStep>) -> Self {
        Self { follower, chain }
    }

    /// Resolves `url` to its final destination, or returns it unchanged.
    ///
    /// `raw` is the link as discovered; when it still carries the short-link path
    /// it is what gets requested, since the domain-only key alone would only reach
    /// the shortener's homepage.
    pub async fn resolve(&self, url: &CanonicalUrl, raw: &str) -> String {
        if !is_shortener(url.as_str()) {
            return url.to_string();
        }

        let target = request_url(url, raw);
        for step in &self.chain {
            let follower = Arc::clone(&self.follower);
            let step = *step;
            let request = target.clone();
            let attempt = tokio::task::spawn_blocking(move || follower.follow(&request, &step))
                .await
                .unwrap_or_else(|e| Err(ProbeError::Join(e.to_string())));
            match attempt {
                Ok(final_url) => {
                    tracing::debug!(url = %url, %final_url, method = ?step.method, "resolved redirect");
                    return final_url;
                }
                Err(e) => {
                    tracing::debug!(url = %url, method = ?step.method, "redirect probe failed: {}", e);
                }
            }
        }

        tracing::info!(url = %url, "redirect resolution failed; keeping original");
        url.to_string()
    }
}

/// The raw link when it belongs to the same shortener, else `https://{key}`.
fn request_url(url: &CanonicalUrl, raw: &str) -> String {
    let raw = raw.trim();
    let same_link = crate::url_model::normalize(raw).as_ref() == Some(url);
    if !same_link {
        return format!("https://{}", url);
    }
    for scheme in ["https://", "http://"] {
        let prefix = raw.get(..scheme.len());
        if prefix.is_some_and(|p| p.eq_ignore_ascii_case(scheme)) {
            return format!("{}{}", scheme, &raw[scheme.len()..]);
        }
    }
    format!("https://{}", raw)
}

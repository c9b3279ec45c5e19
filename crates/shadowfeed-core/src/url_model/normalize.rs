//! Raw URL → canonical domain key.

use url::{Host, Url};

use super::CanonicalUrl;

/// Path suffixes that mark a link as a static asset rather than a tool.
pub const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".css", ".js", ".svg", ".ico", ".woff", ".woff2", ".ttf",
    ".eot",
];

/// Aggregators, platforms, proxies and mirrors that are never tools themselves.
/// A host matches when it equals an entry or is a subdomain of one.
pub const BLOCKED_DOMAINS: &[&str] = &[
    "producthunt.com",
    "reddit.com",
    "ycombinator.com",
    "substackcdn.com",
    "github.com",
    "google.com",
    "youtube.com",
    "youtu.be",
    "googleusercontent.com",
    "translate.goog",
    "archive.org",
];

/// Canonicalizes a raw URL into a domain-only key.
///
/// Steps, each able to reject:
/// 1. Drop the query (and fragment); unparseable input is cut at the first `?`/`#`.
/// 2. Lowercase, strip `http://`, `https://`, `www.` and trailing `/`.
/// 3. Reject static asset links by extension.
/// 4. Reject hosts on the platform denylist (exact or subdomain).
/// 5. Keep only the host.
///
/// Pure and deterministic.
///
/// # Examples
///
/// - `normalize("https://www.MyAgent.ai/pricing?ref=hn")` → `Some("myagent.ai")`
/// - `normalize("https://cdn.tool.dev/logo.png")` → `None`
/// - `normalize("https://old.reddit.com/r/SaaS")` → `None`
pub fn normalize(raw: &str) -> Option<CanonicalUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = strip_query(raw).to_lowercase();
    let mut rest = lowered.as_str();
    rest = rest.strip_prefix("http://").unwrap_or(rest);
    rest = rest.strip_prefix("https://").unwrap_or(rest);
    rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.trim_end_matches('/');

    if ASSET_EXTENSIONS.iter().any(|ext| rest.ends_with(ext)) {
        return None;
    }

    let host = ascii_host(rest.split('/').next().unwrap_or_default())?;
    if host.is_empty() || is_blocked_host(&host) {
        return None;
    }

    Some(CanonicalUrl(host))
}

/// Punycode form of an IDN host (port kept), so schemeless input keys the same
/// as what `Url` produces. Hosts that are not valid IDNA are rejected.
fn ascii_host(host: &str) -> Option<String> {
    if host.is_ascii() {
        return Some(host.to_string());
    }
    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => (name, Some(port)),
        _ => (host, None),
    };
    let name = Host::parse(name).ok()?.to_string();
    Some(match port {
        Some(port) => format!("{}:{}", name, port),
        None => name,
    })
}

fn strip_query(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn is_blocked_host(host: &str) -> bool {
    let host = host_of(host);
    BLOCKED_DOMAINS.iter().any(|blocked| {
        host == *blocked
            || host
                .strip_suffix(blocked)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Host part of a canonical key or bare `host[:port][/path]` string, without the port.
/// IPv6 literals lose their brackets.
pub fn host_of(s: &str) -> &str {
    let authority = s.split('/').next().unwrap_or_default();
    if let Some(inner) = authority.strip_prefix('[') {
        return inner.split(']').next().unwrap_or_default();
    }
    authority.split(':').next().unwrap_or_default()
}

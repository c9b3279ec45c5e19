//! Known-good domains that are never reported.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use super::normalize::host_of;

/// Set of allowlisted domains loaded from a newline-delimited file.
///
/// A host is allowed if it equals an entry or is a strict subdomain of one
/// (`registry.npmjs.com` matches `npmjs.com`, `evilnpmjs.com` does not).
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    domains: HashSet<String>,
}

impl Allowlist {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses allowlist text: one domain per line, blank lines and `#` comments ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_entries(text.lines())
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = entries
            .into_iter()
            .filter_map(|line| {
                let entry = line.as_ref().trim();
                if entry.is_empty() || entry.starts_with('#') {
                    return None;
                }
                Some(entry.trim_start_matches('.').to_lowercase())
            })
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { domains }
    }

    /// Loads the allowlist file. A missing file is an error: a configured allowlist must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read allowlist: {}", path.display()))?;
        let list = Self::parse(&text);
        tracing::debug!(entries = list.len(), "loaded allowlist from {}", path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// True when `host` (a canonical key; any port is ignored) is an entry or a subdomain of one.
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = host_of(host).to_lowercase();
        let mut candidate = host.as_str();
        loop {
            if self.domains.contains(candidate) {
                return true;
            }
            match candidate.find('.') {
                Some(idx) => candidate = &candidate[idx + 1..],
                None => return false,
            }
        }
    }
}

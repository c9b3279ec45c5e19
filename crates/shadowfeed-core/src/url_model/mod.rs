//! URL modeling: canonical domain keys and allowlist matching.
//!
//! Every raw URL a collector emits is reduced to a [`CanonicalUrl`] (lowercase
//! host, no scheme, no `www.`, no path/query) before it is compared, looked up
//! in the record store, or enriched. Rejected inputs yield `None`.

mod allowlist;
mod normalize;

pub use allowlist::Allowlist;
pub use normalize::{host_of, normalize, ASSET_EXTENSIONS, BLOCKED_DOMAINS};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized, domain-only comparison key for a discovered tool.
///
/// Two canonical URLs are equal iff their strings are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Wraps an already-normalized key (e.g. a `Clean_URL` column read back from the store).
    pub fn from_normalized(s: impl Into<String>) -> Self {
        CanonicalUrl(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host without any `:port` suffix, suitable for DNS lookup.
    pub fn host(&self) -> &str {
        host_of(&self.0)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Per-run dedup set shared by all workers.

use dashmap::DashSet;
use std::sync::Arc;

use crate::url_model::CanonicalUrl;

/// Canonical URLs claimed so far in this run. Cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct RuntimeClaims {
    seen: Arc<DashSet<CanonicalUrl>>,
}

impl RuntimeClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-insert: true for exactly one caller per URL.
    pub fn claim(&self, url: &CanonicalUrl) -> bool {
        self.seen.insert(url.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_loses() {
        let claims = RuntimeClaims::new();
        let url = CanonicalUrl::from_normalized("a.io");
        assert!(claims.claim(&url));
        assert!(!claims.claim(&url));
        assert!(claims.clone().claim(&CanonicalUrl::from_normalized("b.io")));
        assert_eq!(claims.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_claims_have_one_winner() {
        let claims = RuntimeClaims::new();
        let url = CanonicalUrl::from_normalized("contested.io");
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let claims = claims.clone();
            let url = url.clone();
            set.spawn(async move { claims.claim(&url) });
        }
        let mut winners = 0;
        while let Some(won) = set.join_next().await {
            if won.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

//! Heuristic risk scoring.

use std::fmt;

use super::hosting::HostingProvider;
use crate::collect::SourceKind;
use crate::config::ScoringConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        f.write_str(s)
    }
}

fn source_weight(cfg: &ScoringConfig, kind: SourceKind) -> u32 {
    match kind {
        SourceKind::Reddit | SourceKind::HackerNews => cfg.high_suspicion_source,
        SourceKind::GitHub => cfg.low_suspicion_source,
        SourceKind::Directory | SourceKind::Other => 0,
    }
}

/// Sum of source, keyword and hosting weights. Pure; the same inputs always give the same score.
pub fn risk_score(
    cfg: &ScoringConfig,
    domain: &str,
    kind: SourceKind,
    provider: &HostingProvider,
) -> u32 {
    let domain = domain.to_lowercase();
    let mut score = source_weight(cfg, kind);
    for keyword in &cfg.keywords {
        if !keyword.is_empty() && domain.contains(&keyword.to_lowercase()) {
            score += cfg.keyword_weight;
        }
    }
    if provider.is_unknown() {
        score += cfg.unknown_host;
    }
    if provider.is_cdn() {
        score += cfg.cdn_host;
    }
    score
}

pub fn tier(cfg: &ScoringConfig, score: u32) -> RiskTier {
    if score >= cfg.high_threshold {
        RiskTier::High
    } else if score >= cfg.medium_threshold {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_suspicion_agent_domain_without_rdns() {
        let cfg = ScoringConfig::default();
        let score = risk_score(
            &cfg,
            "myagent.ai",
            SourceKind::Reddit,
            &HostingProvider::Unknown,
        );
        assert_eq!(score, 120);
        assert_eq!(tier(&cfg, score), RiskTier::High);
    }

    #[test]
    fn reddit_and_hacker_news_weigh_the_same() {
        let cfg = ScoringConfig::default();
        let p = HostingProvider::Aws;
        assert_eq!(
            risk_score(&cfg, "plain.io", SourceKind::Reddit, &p),
            risk_score(&cfg, "plain.io", SourceKind::HackerNews, &p)
        );
    }

    #[test]
    fn cdn_weight_and_low_source() {
        let cfg = ScoringConfig::default();
        let score = risk_score(&cfg, "plain.io", SourceKind::GitHub, &HostingProvider::Cloudflare);
        assert_eq!(score, 25);
        assert_eq!(tier(&cfg, score), RiskTier::Medium);
    }

    #[test]
    fn named_provider_from_unlisted_source_is_low() {
        let cfg = ScoringConfig::default();
        let provider = HostingProvider::Other("host.example.net".to_string());
        let score = risk_score(&cfg, "plain.io", SourceKind::Directory, &provider);
        assert_eq!(score, 0);
        assert_eq!(tier(&cfg, score), RiskTier::Low);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let cfg = ScoringConfig::default();
        assert_eq!(tier(&cfg, 50), RiskTier::High);
        assert_eq!(tier(&cfg, 49), RiskTier::Medium);
        assert_eq!(tier(&cfg, 20), RiskTier::Medium);
        assert_eq!(tier(&cfg, 19), RiskTier::Low);
    }

    #[test]
    fn custom_weights_apply() {
        let cfg = ScoringConfig {
            keywords: vec!["gpt".to_string()],
            keyword_weight: 7,
            ..ScoringConfig::default()
        };
        let score = risk_score(&cfg, "chatgpt-bot.app", SourceKind::Other, &HostingProvider::Gcp);
        assert_eq!(score, 7);
    }
}

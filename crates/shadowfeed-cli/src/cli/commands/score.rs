//! `shadowfeed score` – enrich one domain with live DNS and print its score.

use anyhow::{Context, Result};
use shadowfeed_core::config::FeedConfig;
use shadowfeed_core::enrich::{DnsHostLookup, Enricher};
use shadowfeed_core::url_model::normalize;
use std::sync::Arc;

pub async fn run_score(cfg: &FeedConfig, domain: &str, source: &str) -> Result<()> {
    let Some(key) = normalize(domain) else {
        anyhow::bail!("{} is filtered by normalization", domain);
    };
    let enricher = Enricher::new(Arc::new(DnsHostLookup::from_system_conf()), cfg.scoring());
    let result = enricher
        .enrich(&key, source)
        .await
        .with_context(|| format!("enrich {}", key))?;
    println!("domain:   {}", key);
    println!("ip:       {}", result.ip);
    println!("provider: {}", result.provider);
    println!("score:    {} ({})", result.risk_score, result.tier);
    Ok(())
}

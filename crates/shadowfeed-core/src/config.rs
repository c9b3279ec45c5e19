use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Risk scoring weights and tier thresholds (optional `[scoring]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base weight for the high-suspicion feeds (Reddit, Hacker News).
    pub high_suspicion_source: u32,
    /// Base weight for the low-suspicion feed (GitHub).
    pub low_suspicion_source: u32,
    /// Substrings in the domain that each add `keyword_weight`.
    pub keywords: Vec<String>,
    pub keyword_weight: u32,
    /// Added when neither the prefix table nor reverse DNS identified the host.
    pub unknown_host: u32,
    /// Added when the host is a well-known CDN (origin hidden).
    pub cdn_host: u32,
    /// Scores at or above this are "High".
    pub high_threshold: u32,
    /// Scores at or above this (and below `high_threshold`) are "Medium".
    pub medium_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_suspicion_source: 80,
            low_suspicion_source: 20,
            keywords: vec!["ai".to_string(), "agent".to_string(), "bot".to_string()],
            keyword_weight: 10,
            unknown_host: 20,
            cdn_host: 5,
            high_threshold: 50,
            medium_threshold: 20,
        }
    }
}

/// Collector parameters (optional `[sources]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub github_topics: Vec<String>,
    /// Only repositories created within this many months are searched.
    pub github_lookback_months: u32,
    pub github_max_pages: u32,
    pub subreddits: Vec<String>,
    pub hn_query: String,
    pub hn_lookback_days: i64,
    pub hn_max_pages: u32,
    pub directory_url: String,
    /// Pause between consecutive requests to the same feed, in milliseconds.
    pub request_delay_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github_topics: vec![
                "ai-agent".to_string(),
                "gpt-wrapper".to_string(),
                "llm-tool".to_string(),
            ],
            github_lookback_months: 6,
            github_max_pages: 10,
            subreddits: vec!["SideProject".to_string(), "SaaS".to_string()],
            hn_query: "AI".to_string(),
            hn_lookback_days: 90,
            hn_max_pages: 200,
            directory_url: "https://www.futurepedia.io/new".to_string(),
            request_delay_ms: 1000,
        }
    }
}

impl SourcesConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Global configuration loaded from `~/.config/shadowfeed/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of concurrent pipeline workers.
    pub workers: usize,
    /// Capacity of the bounded work and result queues.
    pub queue_capacity: usize,
    /// Per-request timeout for redirect probes and collector fetches.
    pub http_timeout_secs: u64,
    /// Redirect hops followed before giving up on a shortener.
    pub max_redirects: u32,
    pub user_agent: String,
    /// Record store path; defaults to `~/.local/state/shadowfeed/master_threat_db.csv`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Newline-delimited allowlist; no allowlist when missing.
    #[serde(default)]
    pub allowlist_path: Option<PathBuf>,
    /// Run statistics artifact; defaults to `~/.local/state/shadowfeed/ingest_stats.json`.
    #[serde(default)]
    pub stats_path: Option<PathBuf>,
    /// Optional scoring overrides; if missing, built-in defaults are used.
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
    #[serde(default)]
    pub sources: Option<SourcesConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            queue_capacity: 100,
            http_timeout_secs: 10,
            max_redirects: 10,
            user_agent: "ShadowAI-Feed-Generator/1.0".to_string(),
            db_path: None,
            allowlist_path: None,
            stats_path: None,
            scoring: None,
            sources: None,
        }
    }
}

impl FeedConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn sources(&self) -> SourcesConfig {
        self.sources.clone().unwrap_or_default()
    }

    /// Configured record store path, or the XDG state default.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("master_threat_db.csv")),
        }
    }

    /// Configured stats artifact path, or the XDG state default.
    pub fn resolved_stats_path(&self) -> Result<PathBuf> {
        match &self.stats_path {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("ingest_stats.json")),
        }
    }
}

/// `~/.local/state/shadowfeed`.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shadowfeed")?;
    Ok(xdg_dirs.get_state_home().join("shadowfeed"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shadowfeed")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FeedConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FeedConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FeedConfig = toml::from_str(&data)?;
    Ok(cfg)
}

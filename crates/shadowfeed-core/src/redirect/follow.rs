//! Single redirect-probe step over libcurl.

use std::time::Duration;

use super::chain::{ProbeMethod, ProbeStep};

/// Failure of one probe step. Never escapes the resolver; it only moves the chain along.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("probe task join: {0}")]
    Join(String),
}

/// Follows redirects for one URL with one method and reports the effective URL.
///
/// Blocking; the resolver calls it from `spawn_blocking`.
pub trait RedirectFollower: Send + Sync {
    fn follow(&self, url: &str, step: &ProbeStep) -> Result<String, ProbeError>;
}

/// Production follower backed by the curl crate.
#[derive(Debug, Clone)]
pub struct CurlFollower {
    max_redirects: u32,
    user_agent: String,
}

impl CurlFollower {
    pub fn new(max_redirects: u32, user_agent: impl Into<String>) -> Self {
        Self {
            max_redirects,
            user_agent: user_agent.into(),
        }
    }
}

impl RedirectFollower for CurlFollower {
    fn follow(&self, url: &str, step: &ProbeStep) -> Result<String, ProbeError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        match step.method {
            ProbeMethod::Head => easy.nobody(true)?,
            ProbeMethod::Get => easy.get(true)?,
        }
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(step.timeout.min(Duration::from_secs(15)))?;
        easy.timeout(step.timeout)?;
        easy.useragent(&self.user_agent)?;

        let performed = {
            let mut transfer = easy.transfer();
            // Body is irrelevant; only the final location matters.
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.perform()
        };
        if let Err(e) = performed {
            // Hop bound reached: the last location curl reached is the answer.
            if !e.is_too_many_redirects() {
                return Err(e.into());
            }
        }

        let code = easy.response_code()?;
        if step.require_success && code >= 400 {
            return Err(ProbeError::Status(code));
        }

        let effective = easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string());
        Ok(effective)
    }
}

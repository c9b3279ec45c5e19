//! Blocking HTTP GET for collectors (curl), plus the async wrapper they call.

use std::sync::Arc;
use std::time::Duration;

/// Cap on a single response body; feeds and listing pages are far smaller.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("transport task join: {0}")]
    Join(String),
}

/// HTTP GET with extra request headers. Blocking; use [`fetch`] from async code.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct CurlTransport {
    timeout: Duration,
    user_agent: String,
}

impl CurlTransport {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

impl HttpTransport for CurlTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.timeout.min(Duration::from_secs(15)))?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;
        easy.accept_encoding("")?;

        // A "User-Agent" entry here replaces the default one above.
        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if body.len() + data.len() > MAX_BODY_BYTES {
                    // Short write aborts the transfer.
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok(HttpResponse { status, body })
    }
}

/// Runs a GET on the blocking pool; non-2xx responses become [`TransportError::Status`].
pub async fn fetch(
    transport: &Arc<dyn HttpTransport>,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<HttpResponse, TransportError> {
    let transport = Arc::clone(transport);
    let url = url.to_string();
    let headers: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let response = tokio::task::spawn_blocking(move || transport.get(&url, &headers))
        .await
        .unwrap_or_else(|e| Err(TransportError::Join(e.to_string())))?;
    if !response.is_success() {
        return Err(TransportError::Status(response.status));
    }
    Ok(response)
}

//! Single-shot page document fetch shared by the document-derived providers.

use std::collections::BTreeMap;
use std::time::Duration;

use radar_core::SiteTarget;
use reqwest::{redirect, Client, Response};

use crate::error::ProviderError;
use crate::names;
use crate::retry::{retry_with_backoff, with_deadline};

/// Cap on how much of a document is kept in memory for analysis.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// A fetched landing page: final URL after redirects, lowercased response
/// headers, and the (possibly truncated) body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FetchedPage {
    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HTTP client for the one document fetch each site analysis performs.
pub struct PageFetcher {
    client: Client,
    deadline: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PageFetcher {
    /// Creates a fetcher with a bounded timeout, descriptive `User-Agent`,
    /// and a redirect limit of 10 hops.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .redirect(redirect::Policy::limited(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            deadline: Duration::from_secs(timeout_secs),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches the site's landing page.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] for HTTP 404.
    /// - [`ProviderError::UnexpectedStatus`] for any other non-2xx status
    ///   (5xx retried).
    /// - [`ProviderError::Http`] on network failure or request timeout.
    /// - [`ProviderError::Timeout`] when retries outlive the configured
    ///   timeout.
    pub async fn fetch(&self, site: &SiteTarget) -> Result<FetchedPage, ProviderError> {
        with_deadline(names::PAGE_FETCH, self.deadline, self.fetch_with_retries(site)).await
    }

    async fn fetch_with_retries(&self, site: &SiteTarget) -> Result<FetchedPage, ProviderError> {
        let url = format!("{}/", site.origin);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(
                        reqwest::header::ACCEPT,
                        "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
                    )
                    .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .send()
                    .await?;

                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ProviderError::NotFound { url });
                }
                if !status.is_success() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let final_url = response.url().to_string();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_ascii_lowercase(), v.to_owned()))
                    })
                    .collect();

                let body = read_capped(response, MAX_BODY_BYTES).await?;

                Ok(FetchedPage {
                    final_url,
                    status: status.as_u16(),
                    headers,
                    body,
                })
            }
        })
        .await
    }
}

/// Reads a response body chunk by chunk, keeping at most `max_bytes`.
/// The rest of the body is never buffered. Invalid UTF-8, including a
/// character split at the cap, is replaced.
pub(crate) async fn read_capped(
    mut response: Response,
    max_bytes: usize,
) -> Result<String, ProviderError> {
    let mut buf: Vec<u8> = Vec::with_capacity(max_bytes.min(64 * 1024));
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

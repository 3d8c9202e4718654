//! Organic search presence from a SerpApi-style search endpoint.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use radar_core::config::DEFAULT_SERP_BASE_URL;
use radar_core::site::parse_http_url;
use radar_core::{KeywordRanking, SeoIntelligence, SiteTarget, TrafficTier};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::names;
use crate::retry::{retry_with_backoff, with_deadline};

const SERVICE: &str = "serpapi";
const CREDENTIAL: &str = "SERPAPI_API_KEY";
const MAX_TOP_PHRASES: usize = 10;
const MAX_KEYWORDS: usize = 3;
const MAX_SCORED_RESULTS: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    related_questions: Vec<RelatedQuestion>,
    #[serde(default)]
    related_searches: Vec<serde_json::Value>,
    knowledge_graph: Option<serde_json::Value>,
    top_stories: Option<serde_json::Value>,
    local_results: Option<serde_json::Value>,
    inline_videos: Option<serde_json::Value>,
    search_information: Option<SearchInformation>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    position: Option<u32>,
    title: Option<String>,
    link: Option<String>,
    sitelinks: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RelatedQuestion {
    question: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchInformation {
    total_results: Option<u64>,
}

/// Client for `site:` presence queries and keyword rank checks.
pub struct SerpClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    deadline: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SerpClient {
    /// Creates a client pointed at the production SerpApi endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_SERP_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the client cannot be constructed,
    /// or [`ProviderError::InvalidBaseUrl`] if `base_url` is not http(s).
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ProviderError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            base_url: base_url.trim_end_matches('/').to_string(),
            deadline: Duration::from_secs(timeout_secs),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables retries for 5xx and rate-limit responses.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Measures the site's indexed presence and, for up to three keyword
    /// hints, where the site ranks organically.
    ///
    /// A failed keyword lookup is recorded as unranked; only the `site:`
    /// query failing fails the provider.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::MissingCredential`] when no API key is configured.
    /// - [`ProviderError::Timeout`] when the queries outlive the configured
    ///   timeout.
    /// - Any error from the `site:` query.
    pub async fn analyze(
        &self,
        site: &SiteTarget,
        keywords: &[String],
    ) -> Result<SeoIntelligence, ProviderError> {
        with_deadline(names::SEO, self.deadline, self.query(site, keywords)).await
    }

    async fn query(
        &self,
        site: &SiteTarget,
        keywords: &[String],
    ) -> Result<SeoIntelligence, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential(CREDENTIAL))?;

        let host = site.host();
        let presence = self.search(api_key, &format!("site:{host}")).await?;

        let mut keyword_rankings = Vec::new();
        for keyword in keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
        {
            let position = match self.search(api_key, keyword).await {
                Ok(response) => rank_of(&response, &host),
                Err(e) => {
                    tracing::debug!(
                        domain = %site.domain,
                        keyword,
                        error = %e,
                        "keyword lookup failed"
                    );
                    None
                }
            };
            keyword_rankings.push(KeywordRanking {
                keyword: keyword.to_string(),
                position,
            });
        }

        Ok(summarize(&presence, keyword_rankings))
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<SerpResponse, ProviderError> {
        let url = format!(
            "{}/search.json?engine=google&num=10&q={}&api_key={}",
            self.base_url,
            utf8_percent_encode(query, NON_ALPHANUMERIC),
            utf8_percent_encode(api_key, NON_ALPHANUMERIC),
        );
        let display_url = format!(
            "{}/search.json?q={}",
            self.base_url,
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let display_url = display_url.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ProviderError::RateLimited {
                        service: SERVICE.to_string(),
                        retry_after_secs: 60,
                    });
                }
                if !status.is_success() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: display_url,
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await
        .map_err(ProviderError::without_url)?;

        let parsed: SerpResponse =
            serde_json::from_str(&body).map_err(|source| ProviderError::Deserialize {
                context: display_url.clone(),
                source,
            })?;
        if let Some(error) = &parsed.error {
            // SerpApi reports empty result sets through the error field.
            if !error.to_lowercase().contains("hasn't returned any results") {
                return Err(ProviderError::NoData(format!("serpapi: {error}")));
            }
        }
        Ok(parsed)
    }
}

/// Builds the search-presence record from a `site:` query response.
#[must_use]
pub fn summarize(
    response: &SerpResponse,
    keyword_rankings: Vec<KeywordRanking>,
) -> SeoIntelligence {
    let features = serp_features(response);
    let indexed_results = response
        .search_information
        .as_ref()
        .and_then(|info| info.total_results)
        .unwrap_or(0);

    let mut top_phrases: Vec<String> = Vec::new();
    for title in response.organic_results.iter().filter_map(|r| r.title.as_deref()) {
        let phrase = title_phrase(title);
        if !phrase.is_empty()
            && !top_phrases
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&phrase))
        {
            top_phrases.push(phrase);
        }
        if top_phrases.len() == MAX_TOP_PHRASES {
            break;
        }
    }

    SeoIntelligence {
        visibility_score: visibility_score(response, indexed_results),
        indexed_results,
        top_phrases,
        serp_features: features,
        related_questions: response
            .related_questions
            .iter()
            .filter_map(|q| q.question.clone())
            .collect(),
        traffic_tier: traffic_tier(indexed_results),
        keyword_rankings,
    }
}

/// 5 points per organic result (first ten) plus 10 for each rich signal.
fn visibility_score(response: &SerpResponse, indexed_results: u64) -> u8 {
    let organic = response.organic_results.len().min(MAX_SCORED_RESULTS);
    let signals = [
        !response.related_questions.is_empty(),
        !response.related_searches.is_empty(),
        response.knowledge_graph.is_some(),
        has_sitelinks(response),
        indexed_results >= 100,
    ];
    let bonus = signals.iter().filter(|s| **s).count() * 10;
    u8::try_from((organic * 5 + bonus).min(100)).unwrap_or(100)
}

#[must_use]
pub fn traffic_tier(indexed_results: u64) -> TrafficTier {
    match indexed_results {
        10_000.. => TrafficTier::High,
        1_000..=9_999 => TrafficTier::Medium,
        50..=999 => TrafficTier::Low,
        _ => TrafficTier::Minimal,
    }
}

fn serp_features(response: &SerpResponse) -> Vec<String> {
    let detected = [
        ("knowledge_graph", response.knowledge_graph.is_some()),
        ("sitelinks", has_sitelinks(response)),
        ("related_questions", !response.related_questions.is_empty()),
        ("related_searches", !response.related_searches.is_empty()),
        ("top_stories", response.top_stories.is_some()),
        ("local_results", response.local_results.is_some()),
        ("inline_videos", response.inline_videos.is_some()),
    ];
    detected
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn has_sitelinks(response: &SerpResponse) -> bool {
    response
        .organic_results
        .iter()
        .any(|r| r.sitelinks.is_some())
}

/// Leading phrase of a result title, without the trailing brand segment.
fn title_phrase(title: &str) -> String {
    let head = title
        .split(['|', '\u{2013}', '\u{2014}'])
        .next()
        .unwrap_or(title);
    let head = head.split(" - ").next().unwrap_or(head);
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Organic position of the first result hosted on `host` (ignoring `www.`).
fn rank_of(response: &SerpResponse, host: &str) -> Option<u32> {
    let target = host.trim_start_matches("www.");
    response
        .organic_results
        .iter()
        .enumerate()
        .find(|(_, r)| {
            r.link
                .as_deref()
                .and_then(link_host)
                .is_some_and(|h| {
                    let h = h.trim_start_matches("www.");
                    h == target || h.ends_with(&format!(".{target}"))
                })
        })
        .map(|(idx, r)| r.position.unwrap_or_else(|| u32::try_from(idx + 1).unwrap_or(u32::MAX)))
}

/// Host of a result link, without port or user info.
fn link_host(link: &str) -> Option<String> {
    parse_http_url(link)?
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

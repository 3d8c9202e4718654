//! Lab performance measurement through a PageSpeed-style API.

use std::collections::HashMap;
use std::time::Duration;

use radar_core::config::DEFAULT_PAGESPEED_BASE_URL;
use radar_core::{PerformanceIntelligence, SiteTarget};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::ProviderError;
use crate::names;
use crate::retry::{retry_with_backoff, with_deadline};

const SERVICE: &str = "pagespeed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

/// Score and timing metrics for one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub score: u8,
    pub largest_contentful_paint_ms: Option<f64>,
    pub input_delay_ms: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Deserialize)]
struct LighthouseResult {
    #[serde(default)]
    categories: Categories,
    #[serde(default)]
    audits: HashMap<String, Audit>,
}

#[derive(Debug, Default, Deserialize)]
struct Categories {
    performance: Option<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Audit {
    numeric_value: Option<f64>,
}

/// Client for the `runPagespeed` endpoint. The API key is optional; anonymous
/// requests share a low public quota.
pub struct PageSpeedClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    deadline: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PageSpeedClient {
    /// Creates a client pointed at the public PageSpeed Insights API.
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
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_PAGESPEED_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the client cannot be constructed,
    /// or [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Trailing slash so `join` appends rather than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            base_url,
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

    /// Measures the site's landing page on mobile and desktop concurrently.
    /// Both strategies must succeed, within the configured timeout.
    ///
    /// # Errors
    ///
    /// Propagates the first strategy failure, or [`ProviderError::Timeout`].
    pub async fn analyze(
        &self,
        site: &SiteTarget,
    ) -> Result<PerformanceIntelligence, ProviderError> {
        let page_url = format!("{}/", site.origin);
        let both = async {
            let (mobile, desktop) = tokio::join!(
                self.run_strategy(&page_url, Strategy::Mobile),
                self.run_strategy(&page_url, Strategy::Desktop),
            );
            Ok::<_, ProviderError>(combine(&mobile?, &desktop?))
        };
        with_deadline(names::PERFORMANCE, self.deadline, both).await
    }

    /// Runs one strategy against `page_url`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] on HTTP 429.
    /// - [`ProviderError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ProviderError::Deserialize`] for an unparseable body.
    /// - [`ProviderError::NoData`] when the response has no performance score.
    /// - [`ProviderError::Http`] on transport failure, with the request URL
    ///   (and so the API key) removed.
    pub async fn run_strategy(
        &self,
        page_url: &str,
        strategy: Strategy,
    ) -> Result<StrategyReport, ProviderError> {
        let url = self.build_url(page_url, strategy)?;
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ProviderError::RateLimited {
                        service: SERVICE.to_string(),
                        retry_after_secs: retry_after(&response).unwrap_or(60),
                    });
                }
                if !status.is_success() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: redact_key(&url),
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await
        .map_err(ProviderError::without_url)?;

        parse_strategy_report(&body).inspect_err(|e| {
            tracing::debug!(
                strategy = strategy.as_str(),
                error = %e,
                "pagespeed response rejected"
            );
        })
    }

    fn build_url(&self, page_url: &str, strategy: Strategy) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join("runPagespeed")
            .map_err(|e| ProviderError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("url", page_url);
            pairs.append_pair("strategy", strategy.as_str());
            pairs.append_pair("category", "performance");
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        Ok(url)
    }
}

/// Parses a `runPagespeed` response body.
///
/// # Errors
///
/// Returns [`ProviderError::Deserialize`] for malformed JSON and
/// [`ProviderError::NoData`] when the performance category score is absent.
pub fn parse_strategy_report(body: &str) -> Result<StrategyReport, ProviderError> {
    let parsed: PageSpeedResponse =
        serde_json::from_str(body).map_err(|source| ProviderError::Deserialize {
            context: "pagespeed runPagespeed".to_string(),
            source,
        })?;
    let result = parsed
        .lighthouse_result
        .ok_or_else(|| ProviderError::NoData("pagespeed response has no lighthouseResult".into()))?;
    let score = result
        .categories
        .performance
        .and_then(|c| c.score)
        .ok_or_else(|| {
            ProviderError::NoData("pagespeed response has no performance score".into())
        })?;

    let metric = |id: &str| result.audits.get(id).and_then(|a| a.numeric_value);

    Ok(StrategyReport {
        score: to_percent(score),
        largest_contentful_paint_ms: metric("largest-contentful-paint"),
        input_delay_ms: metric("max-potential-fid"),
        cumulative_layout_shift: metric("cumulative-layout-shift"),
    })
}

/// Merges both strategies. Timing metrics come from the mobile run, the
/// stricter of the two, falling back to desktop values.
#[must_use]
pub fn combine(mobile: &StrategyReport, desktop: &StrategyReport) -> PerformanceIntelligence {
    let mean = (f64::from(mobile.score) + f64::from(desktop.score)) / 2.0;
    PerformanceIntelligence {
        mobile_score: mobile.score,
        desktop_score: desktop.score,
        largest_contentful_paint_ms: mobile
            .largest_contentful_paint_ms
            .or(desktop.largest_contentful_paint_ms),
        input_delay_ms: mobile.input_delay_ms.or(desktop.input_delay_ms),
        cumulative_layout_shift: mobile
            .cumulative_layout_shift
            .or(desktop.cumulative_layout_shift),
        grade: grade(mean),
    }
}

#[must_use]
pub fn grade(score: f64) -> char {
    match score {
        s if s >= 90.0 => 'A',
        s if s >= 75.0 => 'B',
        s if s >= 50.0 => 'C',
        s if s >= 25.0 => 'D',
        _ => 'F',
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "[redacted]".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "lighthouseResult": {
            "categories": {"performance": {"score": 0.87}},
            "audits": {
                "largest-contentful-paint": {"numericValue": 2450.5},
                "max-potential-fid": {"numericValue": 120},
                "cumulative-layout-shift": {"numericValue": 0.04},
                "speed-index": {"numericValue": 3100}
            }
        }
    }"#;

    #[tokio::test]
    async fn transport_errors_do_not_reveal_the_api_key() {
        let client = PageSpeedClient::with_base_url(
            Some("SECRET-KEY-123"),
            5,
            "radar-test",
            "http://127.0.0.1:9",
        )
        .unwrap();
        let site = radar_core::normalize_site("acme.io").unwrap();
        let err = client.analyze(&site).await.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)), "got {err:?}");
        let text = err.to_string();
        assert!(!text.contains("SECRET"), "key leaked: {text}");
    }

    #[test]
    fn parses_score_and_metrics() {
        let report = parse_strategy_report(SAMPLE).unwrap();
        assert_eq!(report.score, 87);
        assert_eq!(report.largest_contentful_paint_ms, Some(2450.5));
        assert_eq!(report.input_delay_ms, Some(120.0));
        assert_eq!(report.cumulative_layout_shift, Some(0.04));
    }

    #[test]
    fn missing_score_is_no_data() {
        let body = r#"{"lighthouseResult": {"categories": {"performance": {"score": null}}}}"#;
        assert!(matches!(
            parse_strategy_report(body),
            Err(ProviderError::NoData(_))
        ));
    }

    #[test]
    fn malformed_body_is_deserialize_error() {
        assert!(matches!(
            parse_strategy_report("<html>quota page</html>"),
            Err(ProviderError::Deserialize { .. })
        ));
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade(90.0), 'A');
        assert_eq!(grade(89.5), 'B');
        assert_eq!(grade(75.0), 'B');
        assert_eq!(grade(50.0), 'C');
        assert_eq!(grade(25.0), 'D');
        assert_eq!(grade(24.9), 'F');
    }

    #[test]
    fn combine_prefers_mobile_metrics_and_grades_the_mean() {
        let mobile = StrategyReport {
            score: 60,
            largest_contentful_paint_ms: Some(4000.0),
            input_delay_ms: None,
            cumulative_layout_shift: Some(0.2),
        };
        let desktop = StrategyReport {
            score: 100,
            largest_contentful_paint_ms: Some(900.0),
            input_delay_ms: Some(40.0),
            cumulative_layout_shift: Some(0.01),
        };
        let intel = combine(&mobile, &desktop);
        assert_eq!(intel.mobile_score, 60);
        assert_eq!(intel.desktop_score, 100);
        assert_eq!(intel.largest_contentful_paint_ms, Some(4000.0));
        assert_eq!(intel.input_delay_ms, Some(40.0));
        assert_eq!(intel.grade, 'B');
    }

    #[test]
    fn build_url_includes_strategy_and_optional_key() {
        let anonymous =
            PageSpeedClient::with_base_url(None, 5, "radar-test", "https://psi.example/v5")
                .unwrap();
        let url = anonymous
            .build_url("https://acme.io/", Strategy::Mobile)
            .unwrap();
        assert_eq!(url.path(), "/v5/runPagespeed");
        assert!(url.query().unwrap().contains("strategy=mobile"));
        assert!(!url.query().unwrap().contains("key="));

        let keyed =
            PageSpeedClient::with_base_url(Some("k1"), 5, "radar-test", "https://psi.example/v5/")
                .unwrap();
        let url = keyed.build_url("https://acme.io/", Strategy::Desktop).unwrap();
        assert!(url.query().unwrap().contains("key=k1"));
        assert!(redact_key(&url).contains("key=%5Bredacted%5D"));
    }
}

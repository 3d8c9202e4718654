//! Per-site fan-out across every provider.
//!
//! The landing page is fetched once and shared by the document-derived
//! providers; the network-bound providers run alongside that branch and do
//! not wait for it. Every attempted provider yields one [`ProviderStatus`].

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use radar_core::{
    AppConfig, BusinessIntelligence, CompetitorIntel, ContentIntelligence, ProviderResult,
    ProviderStatus, RawDataFlags, SiteTarget, TechIntelligence,
};
use radar_providers::business::has_structured_data;
use radar_providers::{
    analyze_business, analyze_content, analyze_tech, names, PageFetcher, PageSpeedClient,
    ProviderError, SerpClient, SitemapClient,
};

/// Per-site switches derived from the run mode.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub skip_serp: bool,
    pub skip_performance: bool,
    pub keywords: Vec<String>,
}

/// The provider clients shared by every site in a run.
pub struct Providers {
    pub fetcher: PageFetcher,
    pub sitemap: SitemapClient,
    pub performance: PageSpeedClient,
    pub serp: SerpClient,
}

impl Providers {
    /// Builds every provider client with its configured timeout and endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if an HTTP client cannot be constructed or a
    /// configured base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let ua = config.user_agent.as_str();
        Ok(Self {
            fetcher: PageFetcher::new(
                config.page_timeout_secs,
                ua,
                config.max_retries,
                config.retry_backoff_base_ms,
            )?,
            sitemap: SitemapClient::new(
                config.sitemap_timeout_secs,
                ua,
                config.max_retries,
                config.retry_backoff_base_ms,
            )?,
            performance: PageSpeedClient::with_base_url(
                config.pagespeed_api_key.as_deref(),
                config.performance_timeout_secs,
                ua,
                &config.pagespeed_base_url,
            )?
            .with_retries(config.max_retries, config.retry_backoff_base_ms),
            serp: SerpClient::with_base_url(
                config.serpapi_api_key.as_deref(),
                config.serp_timeout_secs,
                ua,
                &config.serp_base_url,
            )?
            .with_retries(config.max_retries, config.retry_backoff_base_ms),
        })
    }
}

/// A merged site record and the status of every provider attempted for it.
#[derive(Debug, Clone)]
pub struct SiteAnalysis {
    pub intel: CompetitorIntel,
    pub statuses: Vec<ProviderStatus>,
}

#[derive(Default)]
struct DocumentFindings {
    content: Option<ContentIntelligence>,
    tech: Option<TechIntelligence>,
    business: Option<BusinessIntelligence>,
    html_fetched: bool,
    structured_data_found: bool,
    statuses: Vec<ProviderStatus>,
}

/// Analyzes one site. Never fails: provider errors become failed statuses
/// and absent sub-records.
pub async fn analyze_site(
    providers: &Providers,
    site: &SiteTarget,
    options: &AnalyzeOptions,
) -> SiteAnalysis {
    let domain = site.domain.as_str();
    let started = Instant::now();

    let document = async {
        let (page, fetch_status) =
            invoke(names::PAGE_FETCH, domain, providers.fetcher.fetch(site)).await;
        let mut findings = DocumentFindings {
            statuses: vec![fetch_status],
            ..DocumentFindings::default()
        };
        let Some(page) = page.into_data() else {
            return findings;
        };

        findings.html_fetched = true;
        findings.structured_data_found = has_structured_data(&page.body);

        let (content, status) =
            invoke(names::CONTENT, domain, async { analyze_content(&page) }).await;
        findings.content = content.into_data();
        findings.statuses.push(status);

        let (tech, status) = invoke(names::TECH, domain, async { analyze_tech(&page) }).await;
        findings.tech = tech.into_data();
        findings.statuses.push(status);

        let (business, status) =
            invoke(names::BUSINESS, domain, async { analyze_business(&page.body) }).await;
        findings.business = business.into_data();
        findings.statuses.push(status);

        findings
    };

    let network = async {
        let structure = invoke(names::STRUCTURE, domain, providers.sitemap.analyze(site));
        let performance = async {
            if options.skip_performance {
                None
            } else {
                Some(invoke(names::PERFORMANCE, domain, providers.performance.analyze(site)).await)
            }
        };
        let seo = async {
            if options.skip_serp {
                None
            } else {
                let call = providers.serp.analyze(site, &options.keywords);
                Some(invoke(names::SEO, domain, call).await)
            }
        };
        tokio::join!(structure, performance, seo)
    };

    let (document, ((structure, structure_status), performance, seo)) =
        tokio::join!(document, network);

    let mut statuses = document.statuses;
    let headers_inspected = statuses.iter().any(|s| s.name == names::TECH);
    let sitemap_found = structure.is_success();
    statuses.push(structure_status);

    let mut intel = CompetitorIntel::empty(site.origin.clone(), site.domain.clone());
    intel.content = document.content;
    intel.tech = document.tech;
    intel.business = document.business;
    intel.structure = structure.into_data();
    if let Some((result, status)) = performance {
        intel.performance = result.into_data();
        statuses.push(status);
    }
    if let Some((result, status)) = seo {
        intel.seo = result.into_data();
        statuses.push(status);
    }
    intel.raw_data = RawDataFlags {
        html_fetched: document.html_fetched,
        headers_inspected,
        structured_data_found: document.structured_data_found,
        sitemap_found,
    };
    intel.analyzed_at = Utc::now();

    tracing::info!(
        domain,
        populated = intel.populated_dimensions(),
        attempted = statuses.len(),
        duration_ms = elapsed_ms(started),
        "site analysis settled"
    );

    SiteAnalysis { intel, statuses }
}

/// Runs one provider call, timing it and folding the outcome into a tagged
/// result plus its status entry.
async fn invoke<T, F>(
    provider: &'static str,
    domain: &str,
    call: F,
) -> (ProviderResult<T>, ProviderStatus)
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    let result = ProviderResult::from_result(call.await);
    let duration_ms = elapsed_ms(started);

    match result.error() {
        None => tracing::debug!(domain, provider, duration_ms, "provider succeeded"),
        Some(error) => tracing::warn!(domain, provider, duration_ms, error, "provider failed"),
    }

    let status = ProviderStatus {
        name: provider.to_string(),
        success: result.is_success(),
        error: result.error().map(str::to_string),
        duration_ms,
    };
    (result, status)
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

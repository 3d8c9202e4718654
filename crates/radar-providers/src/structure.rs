//! Sitemap-driven site structure analysis.
//!
//! Discovers sitemaps through the robots file (falling back to
//! `/sitemap.xml`), follows one level of sitemap-index indirection, and
//! summarizes the URL inventory: page counts by kind, top-level categories,
//! and how recently and how often content changes.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use radar_core::site::path_of;
use radar_core::{FreshnessTier, SiteTarget, StructureIntelligence, UpdateFrequency};
use reqwest::{Client, Url};
use thiserror::Error;

use crate::error::ProviderError;
use crate::fetch::read_capped;
use crate::html::path_contains;
use crate::names;
use crate::retry::{retry_with_backoff, with_deadline};

/// Top-level sitemap documents fetched per site.
const MAX_ROOT_SITEMAPS: usize = 3;
/// Child sitemaps fetched across all sitemap indexes for one site.
const MAX_CHILD_SITEMAPS: usize = 3;
const MAX_CATEGORIES: usize = 15;
/// Cap on one robots or sitemap document held in memory.
const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const BLOG_SEGMENTS: [&str; 5] = ["/blog", "/news", "/articles", "/posts", "/insights"];
const PRODUCT_SEGMENTS: [&str; 5] = ["/product", "/products", "/shop", "/store", "/collections"];

/// One `<url>` or `<sitemap>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    UrlSet(Vec<SitemapEntry>),
    Index(Vec<SitemapEntry>),
}

/// HTTP client for robots and sitemap documents.
pub struct SitemapClient {
    client: Client,
    deadline: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SitemapClient {
    /// Creates a `SitemapClient` with configured timeout and `User-Agent`.
    ///
    /// `timeout_secs` bounds each request and also the whole discovery
    /// walk in [`SitemapClient::analyze`].
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
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            deadline: Duration::from_secs(timeout_secs),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Discovers and summarizes the site's sitemaps.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NoData`] when no sitemap document could be
    ///   fetched and parsed.
    /// - [`ProviderError::Timeout`] when the walk outlives the configured
    ///   timeout.
    pub async fn analyze(
        &self,
        site: &SiteTarget,
    ) -> Result<StructureIntelligence, ProviderError> {
        with_deadline(names::STRUCTURE, self.deadline, self.walk(site)).await
    }

    async fn walk(&self, site: &SiteTarget) -> Result<StructureIntelligence, ProviderError> {
        let mut roots = self.discover_sitemaps(site).await;
        if roots.is_empty() {
            roots.push(site.url_for("/sitemap.xml"));
        }
        roots.truncate(MAX_ROOT_SITEMAPS);

        let mut fetched: Vec<String> = Vec::new();
        let mut entries: Vec<SitemapEntry> = Vec::new();
        let mut children: Vec<String> = Vec::new();
        let mut last_error: Option<ProviderError> = None;

        for root in &roots {
            match self.fetch_document(root).await {
                Ok(SitemapDocument::UrlSet(urls)) => {
                    fetched.push(root.clone());
                    entries.extend(urls);
                }
                Ok(SitemapDocument::Index(sitemaps)) => {
                    fetched.push(root.clone());
                    children.extend(
                        sitemaps
                            .into_iter()
                            .map(|s| s.loc)
                            .filter(|loc| !loc.to_lowercase().ends_with(".gz")),
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        domain = %site.domain,
                        url = %root,
                        error = %e,
                        "sitemap fetch failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        for child in children.iter().take(MAX_CHILD_SITEMAPS) {
            match self.fetch_document(child).await {
                Ok(SitemapDocument::UrlSet(urls)) => {
                    fetched.push(child.clone());
                    entries.extend(urls);
                }
                // Only one level of indirection is followed.
                Ok(SitemapDocument::Index(_)) => {
                    tracing::debug!(
                        domain = %site.domain,
                        url = %child,
                        "skipping nested sitemap index"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        domain = %site.domain,
                        url = %child,
                        error = %e,
                        "child sitemap fetch failed"
                    );
                }
            }
        }

        if fetched.is_empty() {
            let reason = last_error.map_or_else(
                || "no sitemap found".to_string(),
                |e| format!("no sitemap found ({e})"),
            );
            return Err(ProviderError::NoData(reason));
        }

        Ok(summarize(&entries, fetched, Utc::now().date_naive()))
    }

    async fn discover_sitemaps(&self, site: &SiteTarget) -> Vec<String> {
        let robots_url = site.url_for("/robots.txt");
        match self.get_text(&robots_url).await {
            Ok(body) => parse_robots_sitemaps(&body, &site.origin),
            Err(e) => {
                tracing::debug!(domain = %site.domain, error = %e, "robots.txt unavailable");
                Vec::new()
            }
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<SitemapDocument, ProviderError> {
        let body = self.get_text(url).await?;
        parse_sitemap(&body).map_err(|e| match e {
            SitemapError::Malformed(source) => ProviderError::Xml {
                context: url.to_string(),
                source,
            },
            SitemapError::NotASitemap(root) => {
                ProviderError::NoData(format!("{url} has root <{root}>, not a sitemap"))
            }
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound {
                    url: url.to_string(),
                });
            }
            if !status.is_success() {
                return Err(ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            read_capped(response, MAX_DOCUMENT_BYTES).await
        })
        .await
    }
}

/// Extracts `Sitemap:` directives from a robots file, resolving relative
/// references against `origin`.
#[must_use]
pub fn parse_robots_sitemaps(robots: &str, origin: &str) -> Vec<String> {
    let base = Url::parse(origin).ok();
    let mut seen = HashSet::new();
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            if value.starts_with("http://") || value.starts_with("https://") {
                Some(value.to_string())
            } else {
                base.as_ref()?.join(value).ok().map(|u| u.to_string())
            }
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Why a document could not be read as a sitemap.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),
    /// Well-formed XML whose root is neither `urlset` nor `sitemapindex`,
    /// e.g. an HTML error page served with a 200.
    #[error("root element <{0}> is not a sitemap")]
    NotASitemap(String),
}

/// Parses a sitemap or sitemap index document.
///
/// # Errors
///
/// - [`SitemapError::Malformed`] for malformed XML.
/// - [`SitemapError::NotASitemap`] when the root element is not `urlset` or
///   `sitemapindex`, or the document has no root element.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut current_tag = String::new();
    let mut loc = String::new();
    let mut lastmod = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if root.is_none() {
                    check_root(&name)?;
                    root = Some(name.clone());
                }
                if name == "url" || name == "sitemap" {
                    in_entry = true;
                    loc.clear();
                    lastmod.clear();
                }
                current_tag = name;
            }
            Event::Empty(e) => {
                if root.is_none() {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    check_root(&name)?;
                    root = Some(name);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if (name == "url" || name == "sitemap") && in_entry {
                    in_entry = false;
                    if !loc.is_empty() {
                        entries.push(SitemapEntry {
                            loc: loc.clone(),
                            lastmod: parse_lastmod(&lastmod),
                        });
                    }
                }
                current_tag.clear();
            }
            Event::Text(e) => {
                if in_entry {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    match current_tag.as_str() {
                        "loc" => loc = text,
                        "lastmod" => lastmod = text,
                        _ => {}
                    }
                }
            }
            Event::CData(e) => {
                if in_entry {
                    let text = String::from_utf8_lossy(&e).trim().to_string();
                    match current_tag.as_str() {
                        "loc" => loc = text,
                        "lastmod" => lastmod = text,
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(SitemapDocument::Index(entries)),
        Some(_) => Ok(SitemapDocument::UrlSet(entries)),
        None => Err(SitemapError::NotASitemap("none".to_string())),
    }
}

fn check_root(name: &str) -> Result<(), SitemapError> {
    if name == "urlset" || name == "sitemapindex" {
        Ok(())
    } else {
        Err(SitemapError::NotASitemap(name.to_string()))
    }
}

/// Accepts `YYYY-MM-DD` and full W3C datetimes; only the date part is kept.
fn parse_lastmod(raw: &str) -> Option<NaiveDate> {
    let date = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Builds the structure record from a flat list of URL entries.
#[must_use]
pub fn summarize(
    entries: &[SitemapEntry],
    sitemap_urls: Vec<String>,
    today: NaiveDate,
) -> StructureIntelligence {
    let mut seen = HashSet::new();
    let unique: Vec<&SitemapEntry> = entries.iter().filter(|e| seen.insert(&e.loc)).collect();

    let mut blog_pages = 0u32;
    let mut product_pages = 0u32;
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();

    for entry in &unique {
        let path = path_of(&entry.loc)
            .unwrap_or_else(|| entry.loc.clone())
            .to_lowercase();
        if BLOG_SEGMENTS.iter().any(|seg| path_contains(&path, seg)) {
            blog_pages += 1;
        }
        if PRODUCT_SEGMENTS.iter().any(|seg| path_contains(&path, seg)) {
            product_pages += 1;
        }
        if let Some(first) = path.trim_start_matches('/').split('/').next() {
            if !first.is_empty() {
                *category_counts.entry(first.to_string()).or_default() += 1;
            }
        }
    }

    let mut categories: Vec<(String, usize)> = category_counts.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let dates: Vec<NaiveDate> = unique.iter().filter_map(|e| e.lastmod).collect();
    let last_updated = dates.iter().max().copied();

    StructureIntelligence {
        total_pages: u32::try_from(unique.len()).unwrap_or(u32::MAX),
        blog_pages,
        product_pages,
        categories: categories
            .into_iter()
            .take(MAX_CATEGORIES)
            .map(|(name, _)| name)
            .collect(),
        last_updated,
        update_frequency: classify_update_frequency(&dates, today),
        freshness: classify_freshness(last_updated, today),
        sitemap_urls,
    }
}

/// Estimates publishing cadence from `lastmod` dates.
///
/// `daily`: at least seven changes in the last week. `weekly`: any change in
/// the last week or four in the last month. `monthly`: any change in the
/// last month or three in the last quarter.
#[must_use]
pub fn classify_update_frequency(dates: &[NaiveDate], today: NaiveDate) -> UpdateFrequency {
    if dates.is_empty() {
        return UpdateFrequency::Unknown;
    }
    let within = |days: i64| {
        dates
            .iter()
            .filter(|d| (today - **d).num_days() <= days)
            .count()
    };
    let (week, month, quarter) = (within(7), within(30), within(90));
    if week >= 7 {
        UpdateFrequency::Daily
    } else if week >= 1 || month >= 4 {
        UpdateFrequency::Weekly
    } else if month >= 1 || quarter >= 3 {
        UpdateFrequency::Monthly
    } else {
        UpdateFrequency::Rarely
    }
}

#[must_use]
pub fn classify_freshness(last_updated: Option<NaiveDate>, today: NaiveDate) -> FreshnessTier {
    let Some(last) = last_updated else {
        return FreshnessTier::Unknown;
    };
    match (today - last).num_days() {
        ..=30 => FreshnessTier::Fresh,
        31..=180 => FreshnessTier::Moderate,
        _ => FreshnessTier::Stale,
    }
}

#[cfg(test)]
#[path = "structure_test.rs"]
mod tests;

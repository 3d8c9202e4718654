//! Per-site intelligence records produced by the providers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one provider invocation.
///
/// Providers never return `Err` past their own boundary; every failure mode
/// is folded into [`ProviderResult::Failure`] with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderResult<T> {
    Success { data: T },
    Failure { reason: String },
}

impl<T> ProviderResult<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Folds a fallible provider call into a tagged outcome, keeping the
    /// error's display text as the failure reason.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(e) => Self::Failure {
                reason: e.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }

    /// Consumes the outcome, returning the data on success.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }
}

/// Everything collected for one analyzed site.
///
/// A sub-record is `Some` exactly when its provider succeeded. Absent
/// sub-records carry no score information and must not be read as zeroes
/// by anything other than the composite scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorIntel {
    pub url: String,
    pub domain: String,
    pub analyzed_at: DateTime<Utc>,
    pub seo: Option<SeoIntelligence>,
    pub performance: Option<PerformanceIntelligence>,
    pub structure: Option<StructureIntelligence>,
    pub business: Option<BusinessIntelligence>,
    pub tech: Option<TechIntelligence>,
    pub content: Option<ContentIntelligence>,
    pub raw_data: RawDataFlags,
}

impl CompetitorIntel {
    /// Creates a record with every sub-record unset.
    #[must_use]
    pub fn empty(url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
            analyzed_at: Utc::now(),
            seo: None,
            performance: None,
            structure: None,
            business: None,
            tech: None,
            content: None,
            raw_data: RawDataFlags::default(),
        }
    }

    /// Number of sub-records that are populated.
    #[must_use]
    pub fn populated_dimensions(&self) -> usize {
        [
            self.seo.is_some(),
            self.performance.is_some(),
            self.structure.is_some(),
            self.business.is_some(),
            self.tech.is_some(),
            self.content.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Diagnostic flags describing what raw material was available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataFlags {
    pub html_fetched: bool,
    pub headers_inspected: bool,
    pub structured_data_found: bool,
    pub sitemap_found: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficTier {
    High,
    Medium,
    Low,
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRanking {
    pub keyword: String,
    /// 1-based organic position, `None` when the domain did not rank.
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoIntelligence {
    /// Organic visibility in `[0, 100]`.
    pub visibility_score: u8,
    pub indexed_results: u64,
    pub top_phrases: Vec<String>,
    pub serp_features: Vec<String>,
    pub related_questions: Vec<String>,
    pub traffic_tier: TrafficTier,
    pub keyword_rankings: Vec<KeywordRanking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceIntelligence {
    /// Mobile lab score in `[0, 100]`.
    pub mobile_score: u8,
    /// Desktop lab score in `[0, 100]`.
    pub desktop_score: u8,
    pub largest_contentful_paint_ms: Option<f64>,
    pub input_delay_ms: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
    pub grade: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFrequency {
    Daily,
    Weekly,
    Monthly,
    Rarely,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessTier {
    Fresh,
    Moderate,
    Stale,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureIntelligence {
    pub total_pages: u32,
    pub blog_pages: u32,
    pub product_pages: u32,
    pub categories: Vec<String>,
    pub last_updated: Option<NaiveDate>,
    pub update_frequency: UpdateFrequency,
    pub freshness: FreshnessTier,
    pub sitemap_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRating {
    pub value: f64,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIntelligence {
    pub name: Option<String>,
    pub organization_type: String,
    pub founding_date: Option<String>,
    pub employee_range: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<AggregateRating>,
    /// At most ten product names.
    pub products: Vec<String>,
    pub social_profiles: Vec<String>,
    pub contact_channels: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPosture {
    pub https: bool,
    pub hsts: bool,
    /// Hardening headers present besides HSTS.
    pub hardening_headers: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechIntelligence {
    pub cms: Option<String>,
    pub framework: Option<String>,
    pub analytics: Vec<String>,
    pub marketing: Vec<String>,
    pub cdn: Option<String>,
    pub hosting: Option<String>,
    pub ecommerce: Option<String>,
    pub security: SecurityPosture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaDensity {
    None,
    Weak,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIntelligence {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub word_count: u32,
    pub headings: Vec<Heading>,
    pub internal_links: u32,
    pub external_links: u32,
    /// Share of images carrying non-empty alt text, in `[0, 1]`.
    pub image_alt_coverage: f64,
    pub has_blog: bool,
    pub has_pricing: bool,
    pub has_social_proof: bool,
    pub cta_density: CtaDensity,
}

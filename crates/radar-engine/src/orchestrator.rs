//! Run coordination: validate, fan out per site, score, enrich.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use radar_core::{
    normalize_site, AppConfig, CompetitorIntel, ProviderStats, ProviderStatus, RadarReport,
    SiteTarget,
};
use uuid::Uuid;

use crate::analyzer::{analyze_site, elapsed_ms, AnalyzeOptions, Providers, SiteAnalysis};
use crate::error::RadarError;
use crate::insights::{enrich, InsightClient};
use crate::scorer::{classify_position, score_site};

/// Upper bound on competitor sites per run.
pub const MAX_COMPETITORS: usize = 5;

/// Caller-facing run mode.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skips the search-presence and performance providers.
    pub quick: bool,
    /// Keyword hints for the search-presence provider (ignored in quick mode).
    pub keywords: Vec<String>,
}

impl RunOptions {
    fn analyze_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            skip_serp: self.quick,
            skip_performance: self.quick,
            keywords: if self.quick {
                Vec::new()
            } else {
                self.keywords.clone()
            },
        }
    }
}

pub struct RadarEngine {
    providers: Providers,
    insights: InsightClient,
}

impl RadarEngine {
    #[must_use]
    pub fn new(providers: Providers, insights: InsightClient) -> Self {
        Self {
            providers,
            insights,
        }
    }

    /// Builds every provider and the insight client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RadarError::Provider`] or [`RadarError::Insight`] when a
    /// client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, RadarError> {
        Ok(Self::new(
            Providers::from_config(config)?,
            InsightClient::from_config(config)?,
        ))
    }

    /// Analyzes `subject` against `competitors` and returns the enriched
    /// report.
    ///
    /// Provider and insight failures degrade the report; they never fail
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns [`RadarError::InvalidRequest`] when the competitor count is
    /// outside `1..=MAX_COMPETITORS` or any identifier has no host or a
    /// non-http(s) scheme. No provider is called in that case.
    pub async fn run_analysis(
        &self,
        subject: &str,
        competitors: &[String],
        options: &RunOptions,
    ) -> Result<RadarReport, RadarError> {
        let (subject, competitors) = validate_request(subject, competitors)?;
        let started = Instant::now();
        let analyze_options = options.analyze_options();

        tracing::info!(
            domain = %subject.domain,
            competitors = competitors.len(),
            quick = options.quick,
            "radar analysis started"
        );

        let (subject_analysis, competitor_analyses) = tokio::join!(
            analyze_site(&self.providers, &subject, &analyze_options),
            futures::future::join_all(
                competitors
                    .iter()
                    .map(|site| analyze_site(&self.providers, site, &analyze_options)),
            ),
        );

        let report = assemble_report(subject_analysis, competitor_analyses);
        let mut report = enrich(report, &self.insights).await;
        report.execution_ms = elapsed_ms(started);

        tracing::info!(
            domain = %report.your_site.domain,
            position = %report.overall_position,
            execution_ms = report.execution_ms,
            "radar analysis finished"
        );
        Ok(report)
    }
}

fn validate_request(
    subject: &str,
    competitors: &[String],
) -> Result<(SiteTarget, Vec<SiteTarget>), RadarError> {
    if competitors.is_empty() || competitors.len() > MAX_COMPETITORS {
        return Err(RadarError::InvalidRequest(format!(
            "expected 1 to {MAX_COMPETITORS} competitor sites, got {}",
            competitors.len()
        )));
    }
    let parse = |role: &str, raw: &str| {
        normalize_site(raw).ok_or_else(|| {
            RadarError::InvalidRequest(format!("{role} site \"{raw}\" is not an http(s) site"))
        })
    };
    let subject = parse("subject", subject)?;
    let competitors = competitors
        .iter()
        .map(|raw| parse("competitor", raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((subject, competitors))
}

/// Builds the un-enriched report once every site has settled.
///
/// Scores are listed subject first, then competitors in input order.
#[must_use]
pub fn assemble_report(subject: SiteAnalysis, competitors: Vec<SiteAnalysis>) -> RadarReport {
    let provider_summary = summarize_providers(
        std::iter::once(&subject)
            .chain(competitors.iter())
            .flat_map(|analysis| analysis.statuses.iter()),
    );

    let your_site = subject.intel;
    let competitors: Vec<CompetitorIntel> = competitors.into_iter().map(|a| a.intel).collect();

    let subject_score = score_site(&your_site);
    let competitor_scores: Vec<_> = competitors.iter().map(score_site).collect();
    let composites: Vec<f64> = competitor_scores.iter().map(|s| s.composite).collect();
    let overall_position = classify_position(subject_score.composite, &composites);

    let mut scores = Vec::with_capacity(competitor_scores.len() + 1);
    scores.push(subject_score);
    scores.extend(competitor_scores);

    RadarReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        your_site,
        competitors,
        overall_position,
        scores,
        provider_summary,
        ai_insights: None,
        execution_ms: 0,
    }
}

/// Folds status entries into per-provider counts and running averages.
#[must_use]
pub fn summarize_providers<'a>(
    statuses: impl IntoIterator<Item = &'a ProviderStatus>,
) -> BTreeMap<String, ProviderStats> {
    let mut summary: BTreeMap<String, ProviderStats> = BTreeMap::new();
    for status in statuses {
        summary.entry(status.name.clone()).or_default().record(status);
    }
    summary
}

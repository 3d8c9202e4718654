//! Strategic insight enrichment for a scored report.
//!
//! Two producers share the [`AiInsights`] output type: the language-model
//! path ([`InsightClient::generate`]) and the deterministic generator
//! ([`fallback::generate`]). [`enrich`] is the single point that picks one.

mod client;
pub mod fallback;
mod parse;
pub mod prompt;

use radar_core::{AiInsights, RadarReport};

pub use client::InsightClient;
pub use parse::parse_completion;

/// Attaches insights to `report`, falling back to the deterministic
/// generator on any language-model failure.
pub async fn enrich(mut report: RadarReport, client: &InsightClient) -> RadarReport {
    let insights: AiInsights = match client.generate(&report).await {
        Ok(insights) => {
            tracing::info!(model = client.model(), "insights generated by language model");
            insights
        }
        Err(e) => {
            tracing::warn!(error = %e, "language-model insights unavailable, using fallback");
            fallback::generate(&report)
        }
    };
    report.ai_insights = Some(insights);
    report
}

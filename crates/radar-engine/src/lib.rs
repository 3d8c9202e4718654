//! Provider aggregation, scoring and insight enrichment for competitive
//! radar reports.
//!
//! [`RadarEngine::run_analysis`] is the entry point: it analyzes the subject
//! and every competitor concurrently, scores the subject against the
//! competitor average, and attaches strategic insights from a language model
//! or, when that is unavailable, from a deterministic generator.

pub mod analyzer;
pub mod error;
pub mod insights;
pub mod orchestrator;
pub mod scorer;

pub use analyzer::{analyze_site, AnalyzeOptions, Providers, SiteAnalysis};
pub use error::{InsightError, RadarError};
pub use insights::{enrich, InsightClient};
pub use orchestrator::{RadarEngine, RunOptions, MAX_COMPETITORS};
pub use scorer::{classify_position, score_site};

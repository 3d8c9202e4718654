//! Shared data model and configuration for competitive radar analysis.

pub mod app_config;
pub mod config;
pub mod intel;
pub mod report;
pub mod site;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use intel::{
    AggregateRating, BusinessIntelligence, CompetitorIntel, ContentIntelligence, CtaDensity,
    FreshnessTier, Heading, KeywordRanking, PerformanceIntelligence, ProviderResult, RawDataFlags,
    SecurityPosture, SeoIntelligence, StructureIntelligence, TechIntelligence, TrafficTier,
    UpdateFrequency,
};
pub use report::{
    ActionItem, ActionPriority, AiInsights, CompetitorThreat, DimensionScores, ImpactLevel,
    InsightSource, Opportunity, Position, ProviderStats, ProviderStatus, RadarReport,
    ReportSummary, SiteScore, ThreatLevel,
};
pub use site::{normalize_site, SiteTarget};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

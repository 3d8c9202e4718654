//! Report envelope, provider telemetry, and insight types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intel::CompetitorIntel;

/// Telemetry for one provider invocation against one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregated counts for one provider across every analyzed site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub success: u32,
    pub failed: u32,
    pub avg_ms: f64,
}

impl ProviderStats {
    /// Folds one status entry into the running counts and average.
    pub fn record(&mut self, status: &ProviderStatus) {
        let seen = f64::from(self.success + self.failed);
        #[allow(clippy::cast_precision_loss)]
        let duration = status.duration_ms as f64;
        self.avg_ms = (self.avg_ms * seen + duration) / (seen + 1.0);
        if status.success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    #[must_use]
    pub fn invocations(&self) -> u32 {
        self.success + self.failed
    }
}

/// Relative standing of the subject against the competitor average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Leading,
    Competitive,
    CatchingUp,
    Behind,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Leading => write!(f, "leading"),
            Position::Competitive => write!(f, "competitive"),
            Position::CatchingUp => write!(f, "catching_up"),
            Position::Behind => write!(f, "behind"),
        }
    }
}

/// The four scored dimensions for one site, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub performance: f64,
    pub content: f64,
    pub tech: f64,
    pub structure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteScore {
    pub domain: String,
    pub composite: f64,
    pub dimensions: DimensionScores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Critical,
    High,
    Medium,
    Low,
}

/// Which enrichment path produced an [`AiInsights`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub title: String,
    pub description: String,
    pub impact: ImpactLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub priority: ActionPriority,
    pub action: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorThreat {
    pub domain: String,
    pub threat_level: ThreatLevel,
    pub reason: String,
}

/// Strategic narrative attached to a report. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInsights {
    pub positioning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub threat_level: ThreatLevel,
    pub competitor_threats: Vec<CompetitorThreat>,
    pub opportunities: Vec<Opportunity>,
    pub keyword_gaps: Vec<String>,
    pub content_ideas: Vec<String>,
    pub quick_wins: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub source: InsightSource,
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub your_site: CompetitorIntel,
    pub competitors: Vec<CompetitorIntel>,
    pub overall_position: Position,
    pub scores: Vec<SiteScore>,
    pub provider_summary: BTreeMap<String, ProviderStats>,
    pub ai_insights: Option<AiInsights>,
    pub execution_ms: u64,
}

impl RadarReport {
    /// Denormalized fields used for listing and filtering stored reports.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let (high_threat_count, critical_action_count) =
            self.ai_insights.as_ref().map_or((0, 0), |insights| {
                let threats = insights
                    .competitor_threats
                    .iter()
                    .filter(|t| t.threat_level == ThreatLevel::High)
                    .count();
                let critical = insights
                    .action_items
                    .iter()
                    .filter(|a| a.priority == ActionPriority::Critical)
                    .count();
                (threats, critical)
            });

        ReportSummary {
            overall_position: self.overall_position,
            competitor_count: self.competitors.len(),
            high_threat_count,
            critical_action_count,
            execution_ms: self.execution_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub overall_position: Position,
    pub competitor_count: usize,
    pub high_threat_count: usize,
    pub critical_action_count: usize,
    pub execution_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(success: bool, duration_ms: u64) -> ProviderStatus {
        ProviderStatus {
            name: "structure".to_string(),
            success,
            error: (!success).then(|| "boom".to_string()),
            duration_ms,
        }
    }

    #[test]
    fn provider_stats_tracks_counts_and_running_average() {
        let mut stats = ProviderStats::default();
        stats.record(&status(true, 100));
        stats.record(&status(false, 300));
        stats.record(&status(true, 200));
        assert_eq!(stats.success, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.invocations(), 3);
        assert!((stats.avg_ms - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn position_serializes_snake_case() {
        let json = serde_json::to_string(&Position::CatchingUp).unwrap();
        assert_eq!(json, "\"catching_up\"");
        assert_eq!(Position::CatchingUp.to_string(), "catching_up");
    }

    #[test]
    fn status_omits_error_on_success() {
        let json = serde_json::to_value(status(true, 5)).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["durationMs"], 5);
    }

    #[test]
    fn summary_counts_high_threats_and_critical_actions() {
        let insights = AiInsights {
            positioning: "p".to_string(),
            strengths: vec![],
            weaknesses: vec![],
            threat_level: ThreatLevel::High,
            competitor_threats: vec![
                CompetitorThreat {
                    domain: "a.io".to_string(),
                    threat_level: ThreatLevel::High,
                    reason: "r".to_string(),
                },
                CompetitorThreat {
                    domain: "b.io".to_string(),
                    threat_level: ThreatLevel::Low,
                    reason: "r".to_string(),
                },
            ],
            opportunities: vec![],
            keyword_gaps: vec![],
            content_ideas: vec![],
            quick_wins: vec![],
            action_items: vec![
                ActionItem {
                    priority: ActionPriority::Critical,
                    action: "a".to_string(),
                    rationale: "r".to_string(),
                },
                ActionItem {
                    priority: ActionPriority::Low,
                    action: "b".to_string(),
                    rationale: "r".to_string(),
                },
            ],
            source: InsightSource::Fallback,
        };
        let report = RadarReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            your_site: CompetitorIntel::empty("https://me.io", "me.io"),
            competitors: vec![
                CompetitorIntel::empty("https://a.io", "a.io"),
                CompetitorIntel::empty("https://b.io", "b.io"),
            ],
            overall_position: Position::Behind,
            scores: vec![],
            provider_summary: BTreeMap::new(),
            ai_insights: Some(insights),
            execution_ms: 1234,
        };

        let summary = report.summary();
        assert_eq!(summary.competitor_count, 2);
        assert_eq!(summary.high_threat_count, 1);
        assert_eq!(summary.critical_action_count, 1);
        assert_eq!(summary.execution_ms, 1234);
        assert_eq!(summary.overall_position, Position::Behind);
    }
}

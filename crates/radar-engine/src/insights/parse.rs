//! Normalization of a language-model completion into [`AiInsights`].
//!
//! The completion is untrusted: any field may be missing or loosely typed.
//! Missing arrays become empty, unknown enum values fall back to the middle
//! tier, and a missing positioning statement is derived from the report.

use radar_core::{
    ActionItem, ActionPriority, AiInsights, CompetitorThreat, ImpactLevel, InsightSource,
    Opportunity, RadarReport, ThreatLevel,
};
use serde::Deserialize;
use serde_json::Value;

use super::fallback;
use crate::error::InsightError;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawInsights {
    positioning: Option<String>,
    strengths: Vec<Value>,
    weaknesses: Vec<Value>,
    #[serde(alias = "threat_level")]
    threat_level: Option<String>,
    #[serde(alias = "competitor_threats")]
    competitor_threats: Vec<Value>,
    opportunities: Vec<RawOpportunity>,
    #[serde(alias = "keyword_gaps")]
    keyword_gaps: Vec<Value>,
    #[serde(alias = "content_ideas")]
    content_ideas: Vec<Value>,
    #[serde(alias = "quick_wins")]
    quick_wins: Vec<Value>,
    #[serde(alias = "action_items")]
    action_items: Vec<RawAction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawThreat {
    domain: Option<String>,
    #[serde(alias = "threat_level")]
    threat_level: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOpportunity {
    Text(String),
    Detailed {
        title: Option<String>,
        description: Option<String>,
        impact: Option<String>,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAction {
    Text(String),
    Detailed {
        priority: Option<String>,
        action: Option<String>,
        rationale: Option<String>,
    },
    Other(Value),
}

/// Parses a completion body and normalizes every field.
///
/// # Errors
///
/// Returns [`InsightError::Parse`] when the content is not a JSON object or
/// a field has a shape that cannot be coerced.
pub fn parse_completion(content: &str, report: &RadarReport) -> Result<AiInsights, InsightError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(content)).map_err(InsightError::Parse)?;
    if !value.is_object() {
        return Err(InsightError::Parse(serde::de::Error::custom(
            "expected a JSON object",
        )));
    }
    let raw: RawInsights = serde_json::from_value(value).map_err(InsightError::Parse)?;
    Ok(normalize(raw, report))
}

fn normalize(raw: RawInsights, report: &RadarReport) -> AiInsights {
    let positioning = raw
        .positioning
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| fallback::positioning(report));

    AiInsights {
        positioning,
        strengths: texts(raw.strengths),
        weaknesses: texts(raw.weaknesses),
        threat_level: raw
            .threat_level
            .as_deref()
            .and_then(parse_threat)
            .unwrap_or(ThreatLevel::Medium),
        competitor_threats: raw
            .competitor_threats
            .into_iter()
            .filter_map(|value| {
                let t: RawThreat = serde_json::from_value(value).ok()?;
                let domain = non_empty(t.domain)?;
                Some(CompetitorThreat {
                    domain,
                    threat_level: t
                        .threat_level
                        .as_deref()
                        .and_then(parse_threat)
                        .unwrap_or(ThreatLevel::Medium),
                    reason: non_empty(t.reason).unwrap_or_default(),
                })
            })
            .collect(),
        opportunities: raw
            .opportunities
            .into_iter()
            .filter_map(|o| match o {
                RawOpportunity::Text(text) => {
                    let text = non_empty(Some(text))?;
                    Some(Opportunity {
                        title: text.clone(),
                        description: text,
                        impact: ImpactLevel::Medium,
                    })
                }
                RawOpportunity::Detailed {
                    title,
                    description,
                    impact,
                } => {
                    let description = non_empty(description);
                    let title = non_empty(title).or_else(|| description.clone())?;
                    Some(Opportunity {
                        description: description.unwrap_or_else(|| title.clone()),
                        title,
                        impact: impact
                            .as_deref()
                            .and_then(parse_impact)
                            .unwrap_or(ImpactLevel::Medium),
                    })
                }
                RawOpportunity::Other(_) => None,
            })
            .collect(),
        keyword_gaps: texts(raw.keyword_gaps),
        content_ideas: texts(raw.content_ideas),
        quick_wins: texts(raw.quick_wins),
        action_items: raw
            .action_items
            .into_iter()
            .filter_map(|a| match a {
                RawAction::Text(text) => Some(ActionItem {
                    priority: ActionPriority::Medium,
                    action: non_empty(Some(text))?,
                    rationale: String::new(),
                }),
                RawAction::Detailed {
                    priority,
                    action,
                    rationale,
                } => Some(ActionItem {
                    priority: priority
                        .as_deref()
                        .and_then(parse_priority)
                        .unwrap_or(ActionPriority::Medium),
                    action: non_empty(action)?,
                    rationale: non_empty(rationale).unwrap_or_default(),
                }),
                RawAction::Other(_) => None,
            })
            .collect(),
        source: InsightSource::Llm,
    }
}

/// Accepts plain strings and objects carrying a `text`/`title`/`keyword` field.
fn texts(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) => non_empty(Some(s)),
            Value::Object(map) => ["text", "title", "keyword", "idea"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .and_then(|s| non_empty(Some(s.to_string()))),
            _ => None,
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_threat(raw: &str) -> Option<ThreatLevel> {
    match raw.trim().to_lowercase().as_str() {
        "low" => Some(ThreatLevel::Low),
        "medium" | "moderate" => Some(ThreatLevel::Medium),
        "high" => Some(ThreatLevel::High),
        _ => None,
    }
}

fn parse_impact(raw: &str) -> Option<ImpactLevel> {
    match raw.trim().to_lowercase().as_str() {
        "low" => Some(ImpactLevel::Low),
        "medium" | "moderate" => Some(ImpactLevel::Medium),
        "high" => Some(ImpactLevel::High),
        _ => None,
    }
}

fn parse_priority(raw: &str) -> Option<ActionPriority> {
    match raw.trim().to_lowercase().as_str() {
        "critical" | "urgent" => Some(ActionPriority::Critical),
        "high" => Some(ActionPriority::High),
        "medium" => Some(ActionPriority::Medium),
        "low" => Some(ActionPriority::Low),
        _ => None,
    }
}

/// Some models wrap JSON mode output in a Markdown fence anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

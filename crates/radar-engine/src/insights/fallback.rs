//! Deterministic insights derived from direct subject-versus-competitor
//! comparisons. Produces the same shape as the language-model path.

use radar_core::{
    ActionItem, ActionPriority, AiInsights, CompetitorIntel, CompetitorThreat, CtaDensity,
    DimensionScores, FreshnessTier, ImpactLevel, InsightSource, Opportunity, Position,
    RadarReport, SiteScore, ThreatLevel,
};

use crate::scorer::{average_composite, score_site};

const MAX_KEYWORD_GAPS: usize = 10;
/// Dimension gap (points) that counts as a clear strength or weakness.
const DIMENSION_MARGIN: f64 = 10.0;
/// Composite lead (points) that makes a competitor a high threat.
const HIGH_THREAT_MARGIN: f64 = 15.0;
const SLOW_LCP_MS: f64 = 2500.0;

#[derive(Default)]
struct Draft {
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    opportunities: Vec<Opportunity>,
    content_ideas: Vec<String>,
    quick_wins: Vec<String>,
    action_items: Vec<ActionItem>,
}

impl Draft {
    fn strength(&mut self, text: String) {
        push_unique(&mut self.strengths, text);
    }

    fn weakness(&mut self, text: String) {
        push_unique(&mut self.weaknesses, text);
    }

    fn opportunity(&mut self, title: &str, description: String, impact: ImpactLevel) {
        if !self.opportunities.iter().any(|o| o.title == title) {
            self.opportunities.push(Opportunity {
                title: title.to_string(),
                description,
                impact,
            });
        }
    }

    fn content_idea(&mut self, text: String) {
        push_unique(&mut self.content_ideas, text);
    }

    fn quick_win(&mut self, text: &str) {
        push_unique(&mut self.quick_wins, text.to_string());
    }

    fn action(&mut self, priority: ActionPriority, action: &str, rationale: String) {
        if !self.action_items.iter().any(|a| a.action == action) {
            self.action_items.push(ActionItem {
                priority,
                action: action.to_string(),
                rationale,
            });
        }
    }
}

/// Builds insights for `report` without any external call.
#[must_use]
pub fn generate(report: &RadarReport) -> AiInsights {
    let subject = &report.your_site;
    let competitors = report.competitors.as_slice();
    let subject_score = score_site(subject);
    let competitor_scores: Vec<SiteScore> = competitors.iter().map(score_site).collect();

    let mut draft = Draft::default();
    compare_dimensions(&subject_score, &competitor_scores, &mut draft);
    compare_performance(subject, competitors, &mut draft);
    compare_content(subject, competitors, &mut draft);
    compare_structure(subject, competitors, &mut draft);
    compare_tech(subject, &mut draft);
    compare_business(subject, competitors, &mut draft);
    compare_search(subject, competitors, &mut draft);

    let keyword_gaps = keyword_gaps(subject, competitors);
    if let Some(first) = keyword_gaps.first() {
        draft.content_idea(format!(
            "Create a dedicated page covering \"{first}\", a topic competitors already rank for"
        ));
    }

    fill_defaults(&mut draft, &subject_score, report.overall_position);
    draft.action_items.sort_by_key(|a| a.priority);
    draft.opportunities.sort_by_key(|o| impact_rank(o.impact));

    AiInsights {
        positioning: positioning(report),
        strengths: draft.strengths,
        weaknesses: draft.weaknesses,
        threat_level: overall_threat(report.overall_position),
        competitor_threats: competitor_threats(&subject_score, &competitor_scores),
        opportunities: draft.opportunities,
        keyword_gaps,
        content_ideas: draft.content_ideas,
        quick_wins: draft.quick_wins,
        action_items: draft.action_items,
        source: InsightSource::Fallback,
    }
}

/// One-sentence positioning statement from the scored position.
#[must_use]
pub fn positioning(report: &RadarReport) -> String {
    let subject = score_site(&report.your_site).composite;
    let composites: Vec<f64> = report
        .competitors
        .iter()
        .map(|c| score_site(c).composite)
        .collect();
    let average = average_composite(&composites);
    let verb = match report.overall_position {
        Position::Leading => "leads",
        Position::Competitive => "is competitive with",
        Position::CatchingUp => "is catching up to",
        Position::Behind => "trails",
    };
    let noun = if composites.len() == 1 {
        "competitor"
    } else {
        "competitors"
    };
    format!(
        "{} {verb} its {} {noun}, scoring {subject:.1} against a competitor average of {average:.1}.",
        report.your_site.domain,
        composites.len()
    )
}

fn overall_threat(position: Position) -> ThreatLevel {
    match position {
        Position::Leading => ThreatLevel::Low,
        Position::Competitive | Position::CatchingUp => ThreatLevel::Medium,
        Position::Behind => ThreatLevel::High,
    }
}

fn competitor_threats(subject: &SiteScore, competitors: &[SiteScore]) -> Vec<CompetitorThreat> {
    competitors
        .iter()
        .map(|competitor| {
            let lead = competitor.composite - subject.composite;
            let (threat_level, reason) = if lead > HIGH_THREAT_MARGIN {
                (
                    ThreatLevel::High,
                    format!("Scores {lead:.1} points higher overall"),
                )
            } else if lead > 0.0 {
                (
                    ThreatLevel::Medium,
                    format!("Slightly ahead overall (+{lead:.1} points)"),
                )
            } else {
                (
                    ThreatLevel::Low,
                    format!("Scores {:.1} points lower overall", -lead),
                )
            };
            CompetitorThreat {
                domain: competitor.domain.clone(),
                threat_level,
                reason,
            }
        })
        .collect()
}

fn named_dimensions(d: &DimensionScores) -> [(&'static str, f64); 4] {
    [
        ("Performance", d.performance),
        ("Content", d.content),
        ("Technology", d.tech),
        ("Site structure", d.structure),
    ]
}

fn compare_dimensions(subject: &SiteScore, competitors: &[SiteScore], draft: &mut Draft) {
    if competitors.is_empty() {
        return;
    }
    let average = |pick: fn(&DimensionScores) -> f64| {
        average_composite(
            &competitors
                .iter()
                .map(|s| pick(&s.dimensions))
                .collect::<Vec<_>>(),
        )
    };
    let averages = DimensionScores {
        performance: average(|d| d.performance),
        content: average(|d| d.content),
        tech: average(|d| d.tech),
        structure: average(|d| d.structure),
    };
    let own = named_dimensions(&subject.dimensions);
    let avg = named_dimensions(&averages);
    for ((name, own), (_, avg)) in own.into_iter().zip(avg) {
        if own >= avg + DIMENSION_MARGIN {
            draft.strength(format!(
                "{name} score of {own:.0} is ahead of the competitor average ({avg:.0})"
            ));
        } else if own + DIMENSION_MARGIN <= avg {
            draft.weakness(format!(
                "{name} score of {own:.0} trails the competitor average ({avg:.0})"
            ));
        }
    }
}

fn compare_performance(
    subject: &CompetitorIntel,
    competitors: &[CompetitorIntel],
    draft: &mut Draft,
) {
    let competitor_mobile: Vec<f64> = competitors
        .iter()
        .filter_map(|c| c.performance.as_ref())
        .map(|p| f64::from(p.mobile_score))
        .collect();

    match (&subject.performance, competitor_mobile.is_empty()) {
        (Some(perf), false) => {
            let avg = average_composite(&competitor_mobile);
            let own = f64::from(perf.mobile_score);
            if own < avg {
                let gap = avg - own;
                draft.weakness(format!(
                    "Mobile speed score of {own:.0} is below the competitor average of {avg:.0}"
                ));
                draft.opportunity(
                    "Improve mobile performance",
                    format!(
                        "Closing the {gap:.0}-point mobile speed gap removes a ranking and \
                         conversion handicap"
                    ),
                    if gap >= 20.0 {
                        ImpactLevel::High
                    } else {
                        ImpactLevel::Medium
                    },
                );
                draft.action(
                    ActionPriority::High,
                    "Reduce mobile page weight and render-blocking resources",
                    format!("Mobile speed trails competitors by {gap:.0} points"),
                );
            } else if own >= avg + 5.0 {
                draft.strength(format!(
                    "Mobile speed score of {own:.0} beats the competitor average of {avg:.0}"
                ));
            }
        }
        (None, false) => draft.action(
            ActionPriority::Medium,
            "Start monitoring Core Web Vitals",
            "Competitors have measurable performance data and this site does not".to_string(),
        ),
        _ => {}
    }

    if let Some(lcp) = subject
        .performance
        .as_ref()
        .and_then(|p| p.largest_contentful_paint_ms)
        .filter(|lcp| *lcp > SLOW_LCP_MS)
    {
        draft.quick_win(&format!(
            "Compress and preload the largest above-the-fold element (LCP is {lcp:.0} ms)"
        ));
    }
}

fn has_blog(intel: &CompetitorIntel) -> bool {
    intel.content.as_ref().is_some_and(|c| c.has_blog)
        || intel.structure.as_ref().is_some_and(|s| s.blog_pages > 0)
}

fn compare_content(
    subject: &CompetitorIntel,
    competitors: &[CompetitorIntel],
    draft: &mut Draft,
) {
    let blogging = competitors.iter().filter(|c| has_blog(c)).count();
    let subject_blogs = has_blog(subject);

    if blogging > 0 && !subject_blogs {
        draft.weakness("No blog or news section while competitors publish regularly".to_string());
        draft.opportunity(
            "Launch a blog",
            format!(
                "{blogging} of {} competitors run a blog; {} does not",
                competitors.len(),
                subject.domain
            ),
            ImpactLevel::High,
        );
        draft.content_idea(
            "Start a blog answering the questions buyers ask before choosing a provider"
                .to_string(),
        );
        draft.action(
            ActionPriority::High,
            "Publish a content hub with a regular posting cadence",
            "Competitors earn search traffic from blog content".to_string(),
        );
    } else if subject_blogs && blogging == 0 && !competitors.is_empty() {
        draft.strength("Only site in the comparison set with a blog".to_string());
    }

    let Some(content) = &subject.content else {
        if !subject.raw_data.html_fetched {
            draft.action(
                ActionPriority::Critical,
                "Make the landing page reachable to automated clients",
                "The home page could not be fetched, so search engines may struggle too"
                    .to_string(),
            );
        }
        return;
    };

    if !content.has_pricing {
        let competitor_pricing = competitors
            .iter()
            .filter(|c| c.content.as_ref().is_some_and(|c| c.has_pricing))
            .count();
        draft.quick_win("Link a clear pricing page from the home page");
        if competitor_pricing > 0 {
            draft.weakness(format!(
                "No visible pricing while {competitor_pricing} competitor(s) show theirs"
            ));
        }
    }
    if !content.has_social_proof {
        draft.quick_win("Add testimonials and customer logos to the landing page");
    } else {
        draft.strength("Landing page shows social proof".to_string());
    }
    match content.cta_density {
        CtaDensity::None => draft.action(
            ActionPriority::Critical,
            "Add a primary call to action to the landing page",
            "No recognizable call to action was found".to_string(),
        ),
        CtaDensity::Weak => {
            draft.quick_win("Repeat the primary call to action further down the page");
        }
        CtaDensity::Strong => {}
    }
    if content.word_count < 300 {
        draft.content_idea(format!(
            "Expand landing page copy with use cases and outcomes (currently {} words)",
            content.word_count
        ));
    }
    if content.image_alt_coverage < 0.8 {
        draft.quick_win(&format!(
            "Add alt text to images ({:.0}% currently covered)",
            content.image_alt_coverage * 100.0
        ));
    }
}

fn compare_structure(
    subject: &CompetitorIntel,
    competitors: &[CompetitorIntel],
    draft: &mut Draft,
) {
    let competitor_pages: Vec<f64> = competitors
        .iter()
        .filter_map(|c| c.structure.as_ref())
        .map(|s| f64::from(s.total_pages))
        .collect();

    let Some(structure) = &subject.structure else {
        if !competitor_pages.is_empty() {
            draft.quick_win("Publish an XML sitemap and reference it from robots.txt");
        }
        return;
    };

    if structure.freshness == FreshnessTier::Stale {
        draft.weakness("Site content has not been updated in over six months".to_string());
        draft.content_idea(
            "Refresh cornerstone pages with current data and republish them".to_string(),
        );
    }
    if !competitor_pages.is_empty() {
        let avg = average_composite(&competitor_pages);
        let own = f64::from(structure.total_pages);
        if avg >= own * 2.0 && avg >= 20.0 {
            draft.opportunity(
                "Expand site depth",
                format!(
                    "Competitors index about {avg:.0} pages on average versus {} here",
                    structure.total_pages
                ),
                ImpactLevel::Medium,
            );
        }
    }
}

fn compare_tech(subject: &CompetitorIntel, draft: &mut Draft) {
    let Some(tech) = &subject.tech else {
        return;
    };
    let security = tech.security;
    if !security.https {
        draft.action(
            ActionPriority::Critical,
            "Serve every page over HTTPS",
            "The final landing URL is not encrypted".to_string(),
        );
    }
    if !security.hsts {
        draft.action(
            ActionPriority::High,
            "Enable HTTP Strict Transport Security",
            "The strict-transport-security header is missing".to_string(),
        );
    }
    if security.hardening_headers < 2 {
        draft.action(
            ActionPriority::Low,
            "Add security headers such as Content-Security-Policy and X-Content-Type-Options",
            format!(
                "Only {} hardening header(s) detected",
                security.hardening_headers
            ),
        );
    }
    if tech.analytics.is_empty() {
        draft.action(
            ActionPriority::Medium,
            "Install web analytics",
            "No analytics tooling was detected, so conversion changes cannot be measured"
                .to_string(),
        );
    }
    if security.https && security.hsts && security.hardening_headers >= 3 {
        draft.strength(format!(
            "Hardened security posture with HSTS and {} additional security headers",
            security.hardening_headers
        ));
    }
}

fn compare_business(
    subject: &CompetitorIntel,
    competitors: &[CompetitorIntel],
    draft: &mut Draft,
) {
    if subject.business.is_none() {
        draft.quick_win("Add Organization structured data (JSON-LD) to the home page");
    }
    let subject_rated = subject
        .business
        .as_ref()
        .is_some_and(|b| b.rating.is_some());
    let rated_competitors = competitors
        .iter()
        .filter(|c| c.business.as_ref().is_some_and(|b| b.rating.is_some()))
        .count();
    if rated_competitors > 0 && !subject_rated {
        draft.opportunity(
            "Showcase review ratings",
            format!(
                "{rated_competitors} competitor(s) publish aggregate ratings in structured data"
            ),
            ImpactLevel::Medium,
        );
    }
}

fn compare_search(
    subject: &CompetitorIntel,
    competitors: &[CompetitorIntel],
    draft: &mut Draft,
) {
    let competitor_visibility: Vec<f64> = competitors
        .iter()
        .filter_map(|c| c.seo.as_ref())
        .map(|s| f64::from(s.visibility_score))
        .collect();
    let (Some(seo), false) = (&subject.seo, competitor_visibility.is_empty()) else {
        return;
    };
    let avg = average_composite(&competitor_visibility);
    let own = f64::from(seo.visibility_score);
    if own + DIMENSION_MARGIN <= avg {
        draft.weakness(format!(
            "Organic visibility of {own:.0} trails the competitor average of {avg:.0}"
        ));
        draft.opportunity(
            "Grow organic visibility",
            format!("Competitors average {avg:.0}/100 for indexed search presence"),
            ImpactLevel::High,
        );
    } else if own >= avg + DIMENSION_MARGIN {
        draft.strength(format!(
            "Organic visibility of {own:.0} is ahead of the competitor average ({avg:.0})"
        ));
    }
    for ranking in seo.keyword_rankings.iter().filter(|r| r.position.is_none()) {
        draft.content_idea(format!(
            "Write a guide targeting \"{}\", where the site does not rank yet",
            ranking.keyword
        ));
    }
}

/// Topics competitors surface (search phrases, sitemap sections) that the
/// subject does not.
fn keyword_gaps(subject: &CompetitorIntel, competitors: &[CompetitorIntel]) -> Vec<String> {
    let mut own: Vec<String> = Vec::new();
    if let Some(seo) = &subject.seo {
        own.extend(seo.top_phrases.iter().map(|p| p.to_lowercase()));
    }
    if let Some(structure) = &subject.structure {
        own.extend(structure.categories.iter().map(|c| c.to_lowercase()));
    }

    let mut gaps: Vec<String> = Vec::new();
    let candidates = competitors.iter().flat_map(|c| {
        let phrases = c.seo.iter().flat_map(|s| s.top_phrases.iter());
        let sections = c.structure.iter().flat_map(|s| s.categories.iter());
        phrases.chain(sections)
    });
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if lower.len() < 3 || own.contains(&lower) || gaps.iter().any(|g| g.to_lowercase() == lower)
        {
            continue;
        }
        gaps.push(candidate.clone());
        if gaps.len() == MAX_KEYWORD_GAPS {
            break;
        }
    }
    gaps
}

/// Guarantees every narrative list has at least one entry.
fn fill_defaults(draft: &mut Draft, subject: &SiteScore, position: Position) {
    if draft.strengths.is_empty() {
        draft.strength(
            "Comparable footprint to competitors across the measured dimensions".to_string(),
        );
    }
    if draft.weaknesses.is_empty() {
        // First of the lowest-scoring dimensions, in display order.
        let (name, score) = named_dimensions(&subject.dimensions)
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or(("Performance", subject.dimensions.performance));
        draft.weakness(format!(
            "{name} is the lowest-scoring dimension at {score:.0} out of 100"
        ));
    }
    if draft.opportunities.is_empty() {
        draft.opportunity(
            "Deepen the comparison",
            "Run a full analysis with keyword hints to uncover search and speed gaps".to_string(),
            ImpactLevel::Low,
        );
    }
    if draft.content_ideas.is_empty() {
        draft.content_idea(
            "Publish a comparison page explaining how the product differs from alternatives"
                .to_string(),
        );
    }
    if draft.quick_wins.is_empty() {
        draft.quick_win("Review page titles and meta descriptions for the top landing pages");
    }
    if draft.action_items.is_empty() {
        let priority = if position == Position::Behind {
            ActionPriority::High
        } else {
            ActionPriority::Medium
        };
        draft.action(
            priority,
            "Re-run this analysis monthly to track movement against competitors",
            format!("Current position: {position}"),
        );
    }
}

fn impact_rank(impact: ImpactLevel) -> u8 {
    match impact {
        ImpactLevel::High => 0,
        ImpactLevel::Medium => 1,
        ImpactLevel::Low => 2,
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

#[cfg(test)]
#[path = "fallback_test.rs"]
mod tests;

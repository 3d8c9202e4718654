//! Natural-language summary of a report for the completion request.

use radar_core::{CompetitorIntel, RadarReport};

use crate::scorer::score_site;

pub const SYSTEM_PROMPT: &str = "You are a competitive intelligence analyst for websites. \
Given measured data about a subject site and its competitors, return a JSON object with keys: \
positioning (string), strengths (string[]), weaknesses (string[]), \
threatLevel (\"low\" | \"medium\" | \"high\"), \
competitorThreats ({domain, threatLevel, reason}[]), \
opportunities ({title, description, impact: \"high\" | \"medium\" | \"low\"}[], most impactful first), \
keywordGaps (string[]), contentIdeas (string[]), quickWins (string[]), \
actionItems ({priority: \"critical\" | \"high\" | \"medium\" | \"low\", action, rationale}[]). \
Base every claim on the supplied data only.";

/// Builds the user message: the scored position, then one section per site
/// listing only the dimensions that were measured.
#[must_use]
pub fn build_prompt(report: &RadarReport) -> String {
    let subject = score_site(&report.your_site);
    let mut out = format!(
        "Overall position of {} versus the competitor average: {} (composite {:.1}).\n",
        report.your_site.domain, report.overall_position, subject.composite
    );

    out.push_str("\n## Subject site\n");
    out.push_str(&describe_site(&report.your_site));
    for (idx, competitor) in report.competitors.iter().enumerate() {
        out.push_str(&format!("\n## Competitor {}\n", idx + 1));
        out.push_str(&describe_site(competitor));
    }
    out
}

fn describe_site(intel: &CompetitorIntel) -> String {
    let score = score_site(intel);
    let mut out = format!(
        "Domain: {}\nComposite score: {:.1} (performance {:.0}, content {:.0}, tech {:.0}, structure {:.0})\n",
        intel.domain,
        score.composite,
        score.dimensions.performance,
        score.dimensions.content,
        score.dimensions.tech,
        score.dimensions.structure,
    );

    if let Some(seo) = &intel.seo {
        out.push_str(&format!(
            "Search presence: visibility {}/100, ~{} indexed results, traffic tier {:?}",
            seo.visibility_score, seo.indexed_results, seo.traffic_tier
        ));
        if !seo.top_phrases.is_empty() {
            out.push_str(&format!(", top phrases: {}", seo.top_phrases.join("; ")));
        }
        if !seo.serp_features.is_empty() {
            out.push_str(&format!(", result features: {}", seo.serp_features.join(", ")));
        }
        out.push('\n');
        for ranking in &seo.keyword_rankings {
            match ranking.position {
                Some(position) => out.push_str(&format!(
                    "  Ranks #{position} for \"{}\"\n",
                    ranking.keyword
                )),
                None => out.push_str(&format!("  Not ranked for \"{}\"\n", ranking.keyword)),
            }
        }
    }

    if let Some(perf) = &intel.performance {
        out.push_str(&format!(
            "Performance: mobile {}/100, desktop {}/100, grade {}",
            perf.mobile_score, perf.desktop_score, perf.grade
        ));
        if let Some(lcp) = perf.largest_contentful_paint_ms {
            out.push_str(&format!(", LCP {lcp:.0} ms"));
        }
        if let Some(cls) = perf.cumulative_layout_shift {
            out.push_str(&format!(", CLS {cls:.2}"));
        }
        out.push('\n');
    }

    if let Some(structure) = &intel.structure {
        out.push_str(&format!(
            "Site structure: {} pages ({} blog, {} product), freshness {:?}, updates {:?}",
            structure.total_pages,
            structure.blog_pages,
            structure.product_pages,
            structure.freshness,
            structure.update_frequency
        ));
        if !structure.categories.is_empty() {
            out.push_str(&format!(", sections: {}", structure.categories.join(", ")));
        }
        out.push('\n');
    }

    if let Some(business) = &intel.business {
        out.push_str(&format!(
            "Business: {} ({})",
            business.name.as_deref().unwrap_or("unnamed"),
            business.organization_type
        ));
        if let Some(employees) = &business.employee_range {
            out.push_str(&format!(", {employees} employees"));
        }
        if let Some(rating) = &business.rating {
            out.push_str(&format!(", rated {:.1}", rating.value));
        }
        if !business.products.is_empty() {
            out.push_str(&format!(", products: {}", business.products.join(", ")));
        }
        out.push('\n');
    }

    if let Some(tech) = &intel.tech {
        let mut stack: Vec<&str> = Vec::new();
        stack.extend(tech.cms.as_deref());
        stack.extend(tech.framework.as_deref());
        stack.extend(tech.ecommerce.as_deref());
        stack.extend(tech.cdn.as_deref());
        out.push_str(&format!(
            "Technology: stack [{}], analytics [{}], marketing [{}], HTTPS {}, HSTS {}, {} hardening headers\n",
            stack.join(", "),
            tech.analytics.join(", "),
            tech.marketing.join(", "),
            yes_no(tech.security.https),
            yes_no(tech.security.hsts),
            tech.security.hardening_headers
        ));
    }

    if let Some(content) = &intel.content {
        out.push_str(&format!(
            "Content: {} words, {} headings, blog {}, pricing page {}, social proof {}, CTA density {:?}, image alt coverage {:.0}%\n",
            content.word_count,
            content.headings.len(),
            yes_no(content.has_blog),
            yes_no(content.has_pricing),
            yes_no(content.has_social_proof),
            content.cta_density,
            content.image_alt_coverage * 100.0
        ));
        if let Some(title) = &content.title {
            out.push_str(&format!("  Title: {title}\n"));
        }
    }

    if intel.populated_dimensions() == 0 {
        out.push_str("No data could be collected for this site.\n");
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use radar_core::{PerformanceIntelligence, Position};
    use uuid::Uuid;

    use super::*;

    fn report(subject: CompetitorIntel, competitors: Vec<CompetitorIntel>) -> RadarReport {
        RadarReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            your_site: subject,
            competitors,
            overall_position: Position::CatchingUp,
            scores: vec![],
            provider_summary: BTreeMap::new(),
            ai_insights: None,
            execution_ms: 0,
        }
    }

    #[test]
    fn omits_dimensions_without_data() {
        let mut subject = CompetitorIntel::empty("https://me.io", "me.io");
        subject.performance = Some(PerformanceIntelligence {
            mobile_score: 41,
            desktop_score: 77,
            largest_contentful_paint_ms: Some(3800.0),
            input_delay_ms: None,
            cumulative_layout_shift: None,
            grade: 'C',
        });
        let prompt = build_prompt(&report(
            subject,
            vec![CompetitorIntel::empty("https://rival.io", "rival.io")],
        ));

        assert!(prompt.contains("catching_up"));
        assert!(
            prompt.contains("Performance: mobile 41/100, desktop 77/100, grade C, LCP 3800 ms")
        );
        assert!(!prompt.contains("Search presence"));
        assert!(!prompt.contains("Content:"));
        assert!(prompt.contains("## Competitor 1\nDomain: rival.io"));
        assert!(prompt.contains("No data could be collected for this site."));
    }
}

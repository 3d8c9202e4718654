//! Per-dimension scoring and relative position classification.
//!
//! Every function here is pure. A missing sub-record contributes zero to its
//! dimension and the dimension still counts toward the composite mean, so a
//! site with no visible data scores 0 rather than being excluded.

use radar_core::{
    CompetitorIntel, CtaDensity, DimensionScores, FreshnessTier, Position, SiteScore,
    UpdateFrequency,
};

const MAX_SCORE: f64 = 100.0;

/// Gap (in composite points) beyond which the subject leads or trails outright.
const POSITION_BAND: f64 = 20.0;

/// Mean of the mobile and desktop lab scores.
#[must_use]
pub fn performance_score(intel: &CompetitorIntel) -> f64 {
    intel.performance.as_ref().map_or(0.0, |p| {
        (f64::from(p.mobile_score) + f64::from(p.desktop_score)) / 2.0
    })
}

#[must_use]
pub fn content_score(intel: &CompetitorIntel) -> f64 {
    let Some(content) = &intel.content else {
        return 0.0;
    };
    let mut score = 0.0;
    if content.has_blog {
        score += 20.0;
    }
    if content.has_pricing {
        score += 10.0;
    }
    if content.has_social_proof {
        score += 15.0;
    }
    score += match content.cta_density {
        CtaDensity::Strong => 15.0,
        CtaDensity::Weak => 5.0,
        CtaDensity::None => 0.0,
    };
    score += (f64::from(content.word_count) / 100.0).min(20.0);
    score.min(MAX_SCORE)
}

#[must_use]
pub fn tech_score(intel: &CompetitorIntel) -> f64 {
    let Some(tech) = &intel.tech else {
        return 0.0;
    };
    let mut score = 0.0;
    if tech.security.https {
        score += 20.0;
    }
    if tech.security.hsts {
        score += 10.0;
    }
    score += 5.0 * f64::from(tech.security.hardening_headers);
    if !tech.analytics.is_empty() {
        score += 15.0;
    }
    if !tech.marketing.is_empty() {
        score += 15.0;
    }
    if tech.framework.is_some() {
        score += 10.0;
    }
    score.min(MAX_SCORE)
}

#[must_use]
pub fn structure_score(intel: &CompetitorIntel) -> f64 {
    let Some(structure) = &intel.structure else {
        return 0.0;
    };
    let mut score = (f64::from(structure.total_pages) / 10.0).min(30.0);
    if structure.blog_pages > 0 {
        score += 20.0;
    }
    score += match structure.freshness {
        FreshnessTier::Fresh => 25.0,
        FreshnessTier::Moderate => 15.0,
        FreshnessTier::Stale | FreshnessTier::Unknown => 0.0,
    };
    score += match structure.update_frequency {
        UpdateFrequency::Daily => 25.0,
        UpdateFrequency::Weekly => 15.0,
        UpdateFrequency::Monthly => 5.0,
        UpdateFrequency::Rarely | UpdateFrequency::Unknown => 0.0,
    };
    score.min(MAX_SCORE)
}

#[must_use]
pub fn dimension_scores(intel: &CompetitorIntel) -> DimensionScores {
    DimensionScores {
        performance: performance_score(intel),
        content: content_score(intel),
        tech: tech_score(intel),
        structure: structure_score(intel),
    }
}

/// Unweighted mean of the four dimensions.
#[must_use]
pub fn composite(dimensions: &DimensionScores) -> f64 {
    (dimensions.performance + dimensions.content + dimensions.tech + dimensions.structure) / 4.0
}

#[must_use]
pub fn score_site(intel: &CompetitorIntel) -> SiteScore {
    let dimensions = dimension_scores(intel);
    SiteScore {
        domain: intel.domain.clone(),
        composite: composite(&dimensions),
        dimensions,
    }
}

/// Mean composite across competitors; an empty slice averages to 0.
#[must_use]
pub fn average_composite(composites: &[f64]) -> f64 {
    if composites.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = composites.len() as f64;
    composites.iter().sum::<f64>() / count
}

/// Classifies the subject against the competitor average.
///
/// | `diff = subject - average` | Position       |
/// |----------------------------|----------------|
/// | `> 20`                     | `leading`      |
/// | `0 ..= 20`                 | `competitive`  |
/// | `-20 < diff < 0`           | `catching_up`  |
/// | `<= -20`                   | `behind`       |
#[must_use]
pub fn classify_position(subject_composite: f64, competitor_composites: &[f64]) -> Position {
    let diff = subject_composite - average_composite(competitor_composites);
    if diff > POSITION_BAND {
        Position::Leading
    } else if diff >= 0.0 {
        Position::Competitive
    } else if diff > -POSITION_BAND {
        Position::CatchingUp
    } else {
        Position::Behind
    }
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
